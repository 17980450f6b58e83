//! # Serveur HTTP
//!
//! Petite couche au-dessus d'Axum : les routes sont accumulées dans un
//! router partagé, puis servies par [`Server::start`] jusqu'à Ctrl+C ou
//! [`Server::stop`].

use acsconfig::get_config;
use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{
    signal,
    sync::{RwLock, oneshot},
    task::JoinHandle,
};
use tracing::{error, info};

/// Info serveur sérialisable
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerInfo {
    pub name: String,
    pub bind_address: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    bind_address: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    local_addr: Option<SocketAddr>,
    join_handle: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl Server {
    /// Crée un serveur
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `bind_address` - Adresse d'écoute (ex: "0.0.0.0")
    /// * `http_port` - Port HTTP, `0` pour un port libre
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            bind_address: bind_address.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            local_addr: None,
            join_handle: None,
            stop_tx: None,
        }
    }

    pub fn new_configured() -> Self {
        ServerBuilder::new_configured().build()
    }

    /// Ajoute une route GET qui renvoie du JSON
    ///
    /// ```rust,no_run
    /// # use acsserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "127.0.0.1", 7547);
    /// server.add_route("/status", || async {
    ///     serde_json::json!({"status": "online"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).route(path, get(handler));
    }

    /// Ajoute un sous-router
    ///
    /// - Si `path` est "/", il est fusionné au router principal
    /// - Sinon, il est imbriqué sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    /// Copie du router courant
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP.
    ///
    /// Le port est réservé avant le retour ; le service s'arrête sur
    /// Ctrl+C ou [`Server::stop`].
    pub async fn start(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.bind_address, self.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Cannot bind {}", addr))?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);
        info!("Server {} running at http://{}", self.name, local_addr);

        let router = self.router().await;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        self.stop_tx = Some(stop_tx);

        self.join_handle = Some(tokio::spawn(async move {
            let shutdown = async move {
                tokio::select! {
                    result = signal::ctrl_c() => match result {
                        Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
                        Err(err) => error!(error = %err, "Cannot listen for Ctrl+C"),
                    },
                    _ = stop_rx => info!("Arrêt demandé"),
                }
            };
            if let Err(err) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %err, "HTTP server failed");
            }
        }));
        Ok(())
    }

    /// Demande l'arrêt du serveur
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Adresse effectivement écoutée, une fois démarré
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            bind_address: self.bind_address.clone(),
            http_port: self.local_addr.map_or(self.http_port, |a| a.port()),
        }
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    bind_address: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            bind_address: bind_address.into(),
            http_port,
        }
    }

    /// Adresse et port lus dans la configuration globale
    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "ACS".to_string(),
            bind_address: config.get_bind_address(),
            http_port: config.get_http_port(),
        }
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.bind_address, self.http_port)
    }
}
