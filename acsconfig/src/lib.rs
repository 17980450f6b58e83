//! # acsconfig - Configuration de l'ACS
//!
//! Gestion de la configuration YAML du serveur :
//! - configuration par défaut intégrée (`acs.yaml`)
//! - fusion avec le fichier `config.yaml` du répertoire de configuration
//! - surcharges par variables d'environnement `ACS_CONFIG__...`
//! - accesseurs typés et instance globale partagée
//!
//! ## Usage
//!
//! ```no_run
//! use acsconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let prefixes = config.get_cwmp_prefixes();
//!
//! config.set_http_port(8081)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("acs.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_config("").unwrap_or_else(|err| {
        warn!(error = %err, "Failed to load ACS configuration, using embedded defaults");
        Config::embedded()
    }));
}

const ENV_CONFIG_DIR: &str = "ACS_CONFIG";
const ENV_PREFIX: &str = "ACS_CONFIG__";
const CONFIG_DIR_NAME: &str = ".acs";

// Valeurs par défaut
const DEFAULT_HTTP_PORT: u16 = 7547;
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Namespaces SOAP et CWMP, préfixes par défaut
const DEFAULT_PREFIXES: [(&str, &str); 2] = [
    ("http://schemas.xmlsoap.org/soap/envelope/", "soapenv"),
    ("urn:dslforum-org:cwmp-1-0", "cwmp"),
];

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, size: usize) -> Result<()> {
            let n = Number::from(size);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.is_empty() => s,
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: impl Into<String>) -> Result<()> {
            self.set_value($path, Value::String(value.into()))
        }
    };
}

/// Configuration de l'ACS
///
/// Les clés sont insensibles à la casse, sauf les URI de namespace sous
/// `cwmp.prefixes`.
#[derive(Debug)]
pub struct Config {
    config_dir: Option<PathBuf>,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            config_dir: self.config_dir.clone(),
            data: Mutex::new(self.data().clone()),
        }
    }
}

impl Config {
    /// Cherche le répertoire de configuration
    fn find_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return PathBuf::from(CONFIG_DIR_NAME);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(CONFIG_DIR_NAME)
    }

    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Cannot create config directory {}", path.display()))?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Droits en écriture
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Détermine et valide le répertoire de configuration.
    ///
    /// Ordre de recherche :
    /// 1. `directory` s'il n'est pas vide
    /// 2. la variable d'environnement `ACS_CONFIG`
    /// 3. `.acs` dans le répertoire courant
    /// 4. `.acs` dans le répertoire de l'utilisateur
    ///
    /// Le répertoire est créé s'il n'existe pas.
    pub fn config_dir(directory: &str) -> Result<PathBuf> {
        let dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&dir)?;
        Ok(dir)
    }

    /// Charge la configuration depuis `directory` (vide : recherche
    /// standard) en appliquant les variables d'environnement.
    pub fn load_config(directory: &str) -> Result<Self> {
        Self::load_config_with_overrides(directory, env::vars())
    }

    /// Comme [`Config::load_config`], avec des surcharges explicites de la
    /// forme `("ACS_CONFIG__HOST__HTTP_PORT", "8081")`.
    ///
    /// La configuration fusionnée est réécrite dans `config.yaml`.
    pub fn load_config_with_overrides<I>(directory: &str, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir.display(), "Using config directory");

        let path = config_dir.join("config.yaml");
        let mut config_value = Self::default_value()?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path.display(), "Loaded config file");
                let external: Value = serde_yaml::from_slice(&data)
                    .with_context(|| format!("Invalid YAML in {}", path.display()))?;
                merge_yaml(&mut config_value, &lower_keys_value(external, false));
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using default embedded config");
            }
        }

        apply_env_overrides(&mut config_value, overrides);

        let config = Config {
            config_dir: Some(config_dir),
            data: Mutex::new(config_value),
        };
        config.save()?;
        Ok(config)
    }

    /// Configuration par défaut, sans fichier associé
    pub fn embedded() -> Self {
        let data = Self::default_value().unwrap_or_else(|_| Value::Mapping(Mapping::new()));
        Config {
            config_dir: None,
            data: Mutex::new(data),
        }
    }

    fn default_value() -> Result<Value> {
        let value: Value =
            serde_yaml::from_str(DEFAULT_CONFIG).context("Invalid embedded configuration")?;
        Ok(lower_keys_value(value, false))
    }

    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Répertoire de configuration, absent pour [`Config::embedded`]
    pub fn get_config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Sauvegarde la configuration dans `config.yaml`
    pub fn save(&self) -> Result<()> {
        let Some(dir) = &self.config_dir else {
            return Ok(());
        };
        let path = dir.join("config.yaml");
        let yaml = serde_yaml::to_string(&*self.data())?;
        fs::write(&path, yaml).with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }

    /// Définit une valeur (`&["host", "http_port"]`) et sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        set_value_internal(&mut self.data(), path, value)?;
        self.save()
    }

    /// Lit une valeur ; erreur si le chemin n'existe pas
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data();
        let mut current = &*data;
        for (i, key) in path.iter().enumerate() {
            let Value::Mapping(map) = current else {
                return Err(anyhow!("Path {} is not a mapping", path[..i].join(".")));
            };
            current = map
                .get(Value::String(key.to_lowercase()))
                .ok_or_else(|| anyhow!("Path {} does not exist", path[..=i].join(".")))?;
        }
        Ok(current.clone())
    }

    /// Port HTTP du endpoint CWMP (7547 par défaut)
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|n| u16::try_from(n).ok()) {
                Some(port) => port,
                None => {
                    warn!("Invalid HTTP port '{}', using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => s.parse().unwrap_or_else(|_| {
                warn!("Invalid HTTP port '{}', using default {}", s, DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }),
            Ok(_) => {
                warn!("HTTP port not a number or string, using default {}", DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
            Err(err) => {
                warn!("Failed to get HTTP port: {}, using default {}", err, DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
        }
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    impl_string_config!(
        get_bind_address,
        set_bind_address,
        &["host", "bind_address"],
        DEFAULT_BIND_ADDRESS
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_usize_config!(
        get_max_body_size,
        set_max_body_size,
        &["cwmp", "max_body_size"],
        DEFAULT_MAX_BODY_SIZE
    );

    /// Préfixes de sortie (`uri -> préfixe`).
    ///
    /// Les entrées qui ne sont pas des chaînes sont ignorées ; une table
    /// vide ou absente redonne les préfixes `soapenv` / `cwmp`.
    pub fn get_cwmp_prefixes(&self) -> BTreeMap<String, String> {
        let prefixes: BTreeMap<String, String> = match self.get_value(&["cwmp", "prefixes"]) {
            Ok(Value::Mapping(map)) => map
                .into_iter()
                .filter_map(|(uri, prefix)| match (uri, prefix) {
                    (Value::String(uri), Value::String(prefix)) => Some((uri, prefix)),
                    _ => None,
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        if prefixes.is_empty() {
            DEFAULT_PREFIXES
                .iter()
                .map(|(uri, prefix)| (uri.to_string(), prefix.to_string()))
                .collect()
        } else {
            prefixes
        }
    }

    /// Associe `prefix` au namespace `uri`
    pub fn set_cwmp_prefix(&self, uri: &str, prefix: &str) -> Result<()> {
        {
            let mut data = self.data();
            let mut prefixes = match get_mapping(&data, &["cwmp", "prefixes"]) {
                Some(map) => map,
                None => Mapping::new(),
            };
            prefixes.insert(
                Value::String(uri.to_string()),
                Value::String(prefix.to_string()),
            );
            set_value_internal(&mut data, &["cwmp", "prefixes"], Value::Mapping(prefixes))?;
        }
        self.save()
    }
}

/// Instance globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn get_mapping(data: &Value, path: &[&str]) -> Option<Mapping> {
    let mut current = data;
    for key in path {
        current = current.as_mapping()?.get(Value::String(key.to_string()))?;
    }
    current.as_mapping().cloned()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };
    let Value::Mapping(map) = data else {
        return Err(anyhow!("Current node is not a mapping"));
    };
    let key = Value::String(first.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        set_value_internal(entry, rest, value)
    }
}

fn apply_env_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(key_path) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key_path: Vec<&str> = key_path.split("__").collect();
        if let Err(err) = set_value_internal(config, &key_path, convert_env_value(&value)) {
            warn!(variable = %key, error = %err, "Ignoring environment override");
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

/// Passe les clés en minuscules, sauf les URI sous `prefixes`
fn lower_keys_value(value: Value, keep_case: bool) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                match k {
                    Value::String(s) => {
                        let key = if keep_case { s } else { s.to_lowercase() };
                        let child_keeps = key == "prefixes";
                        new_map.insert(Value::String(key), lower_keys_value(v, child_keeps));
                    }
                    k => {
                        new_map.insert(k, lower_keys_value(v, false));
                    }
                }
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(
            seq.into_iter()
                .map(|v| lower_keys_value(v, false))
                .collect(),
        ),
        _ => value,
    }
}

/// Fusionne `external` dans `default` ; les scalaires et séquences
/// d'`external` remplacent ceux de `default`.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
