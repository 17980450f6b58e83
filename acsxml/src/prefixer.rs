//! Réécriture des namespaces par défaut en préfixes
//!
//! Un encodeur produit naturellement des déclarations `xmlns="uri"` répétées
//! à chaque profondeur. Certains firmwares de CPE n'acceptent que la forme
//! préfixée (`soapenv:Envelope`, `cwmp:Inform`). [`Prefixer`] se place
//! entre l'encodeur et le transport : c'est un `io::Write` qui retokenise
//! le flux au fil de l'eau et réécrit chaque nom d'élément ou d'attribut
//! dont le namespace figure dans une table `uri -> préfixe` fixée à la
//! construction.
//!
//! ## Règles
//!
//! - Une déclaration (`xmlns` ou `xmlns:p`) dont l'URI est dans la table est
//!   retirée de la sortie et liée dans la portée de l'élément ; une URI
//!   inconnue est recopiée telle quelle.
//! - `p:local` est résolu en remontant la pile des portées, la plus profonde
//!   d'abord.
//! - Un nom sans préfixe n'est qualifié que par la déclaration par défaut
//!   portée par l'élément lui-même (convention CWMP : les arguments d'une
//!   RPC restent non qualifiés), sauf si
//!   [`Prefixer::inherit_default_namespace`] est activé.
//! - La racine reçoit une déclaration `xmlns:p="uri"` par entrée de la
//!   table, triées par URI.
//! - La balise fermante reprend le nom calculé à l'ouverture.
//!
//! Les écritures peuvent couper un jeton n'importe où : seuls les jetons
//! complets sont traités, le reste attend l'écriture suivante ou
//! [`Prefixer::finish`].

use crate::error::PrefixError;
use quick_xml::escape::unescape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Liaison d'un namespace source dans une portée
#[derive(Debug, Clone)]
enum Binding {
    /// URI présente dans la table : préfixe de sortie
    Mapped(String),
    /// URI hors table, déclaration conservée
    Foreign,
}

#[derive(Debug, Default)]
struct Scope {
    /// Nom brut lu à l'ouverture
    source: String,
    /// Nom réécrit, réutilisé pour la balise fermante
    name: String,
    default: Option<Binding>,
    prefixes: Vec<(String, Binding)>,
}

/// Transcodeur de namespaces en flux
pub struct Prefixer<W: Write> {
    prefixes: BTreeMap<String, String>,
    writer: Writer<W>,
    pending: Vec<u8>,
    stack: Vec<Scope>,
    inherit_default: bool,
    failed: Option<String>,
}

impl<W: Write> Prefixer<W> {
    /// Crée un préfixeur écrivant vers `inner`.
    ///
    /// `prefixes` associe une URI de namespace au préfixe à utiliser.
    pub fn new<I, K, V>(inner: W, prefixes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|(uri, prefix)| (uri.into(), prefix.into()))
                .collect(),
            writer: Writer::new(inner),
            pending: Vec::new(),
            stack: Vec::new(),
            inherit_default: false,
            failed: None,
        }
    }

    /// Qualifie aussi les descendants sans préfixe via la déclaration par
    /// défaut héritée (sémantique XML complète).
    pub fn inherit_default_namespace(mut self, inherit: bool) -> Self {
        self.inherit_default = inherit;
        self
    }

    /// Raison de l'échec du flux, s'il a échoué
    pub fn error(&self) -> Option<&str> {
        self.failed.as_deref()
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Signale la fin du flux et rend la sortie.
    ///
    /// Échoue avec [`PrefixError::Unterminated`] si un jeton est incomplet
    /// ou si un élément n'a pas été fermé.
    pub fn finish(mut self) -> Result<W, PrefixError> {
        if let Some(reason) = self.failed.take() {
            return Err(PrefixError::Failed(reason));
        }
        self.process(true)?;
        if !self.stack.is_empty() {
            return Err(PrefixError::Unterminated);
        }
        self.writer.get_mut().flush()?;
        Ok(self.writer.into_inner())
    }

    fn process(&mut self, at_end: bool) -> Result<(), PrefixError> {
        let ready = complete_prefix(&self.pending);
        let tail_is_markup = self.pending.get(ready) == Some(&b'<');
        if at_end && tail_is_markup {
            self.transcode(ready)?;
            return Err(PrefixError::Unterminated);
        }

        let len = if at_end { self.pending.len() } else { ready };
        self.transcode(len)
    }

    /// Traite les `len` premiers octets en attente, qui forment des jetons
    /// complets.
    fn transcode(&mut self, len: usize) -> Result<(), PrefixError> {
        if len == 0 {
            return Ok(());
        }
        let chunk: Vec<u8> = self.pending.drain(..len).collect();

        let mut reader = Reader::from_reader(chunk.as_slice());
        // L'appariement des balises est fait par la pile de portées, qui
        // survit d'un morceau à l'autre.
        reader.config_mut().check_end_names = false;
        reader.config_mut().allow_unmatched_ends = true;

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(start) => {
                    let tag = self.push(&start)?;
                    self.writer.write_event(Event::Start(tag))?;
                }
                Event::Empty(start) => {
                    let tag = self.push(&start)?;
                    self.stack.pop();
                    self.writer.write_event(Event::Empty(tag))?;
                }
                Event::End(end) => {
                    let tag = self.pop(&end)?;
                    self.writer.write_event(Event::End(tag))?;
                }
                event => self.writer.write_event(event)?,
            }
            self.writer.get_mut().flush()?;
        }
        Ok(())
    }

    fn lookup_prefix(&self, prefix: &str) -> Option<&Binding> {
        self.stack.iter().rev().find_map(|scope| {
            scope
                .prefixes
                .iter()
                .find(|(p, _)| p == prefix)
                .map(|(_, binding)| binding)
        })
    }

    fn lookup_default(&self) -> Option<&Binding> {
        if self.inherit_default {
            self.stack.iter().rev().find_map(|scope| scope.default.as_ref())
        } else {
            self.stack.last().and_then(|scope| scope.default.as_ref())
        }
    }

    /// Réécrit `p:local` (ou `local` pour un élément) selon les portées
    fn rewrite(&self, raw: &str, is_element: bool) -> String {
        let binding = match raw.split_once(':') {
            Some((prefix, _)) if prefix == "xml" => None,
            Some((prefix, _)) => self.lookup_prefix(prefix),
            None if is_element => self.lookup_default(),
            None => None,
        };
        match binding {
            Some(Binding::Mapped(target)) => {
                let local = raw.split_once(':').map_or(raw, |(_, local)| local);
                format!("{}:{}", target, local)
            }
            _ => raw.to_string(),
        }
    }

    fn push(&mut self, start: &BytesStart<'_>) -> Result<BytesStart<'static>, PrefixError> {
        let mut scope = Scope {
            source: std::str::from_utf8(start.name().as_ref())?.to_string(),
            ..Scope::default()
        };
        let mut kept: Vec<(String, Vec<u8>)> = Vec::new();

        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();

            let declared = if key == "xmlns" {
                Some(None)
            } else {
                key.strip_prefix("xmlns:").map(|p| Some(p.to_string()))
            };
            let Some(declared) = declared else {
                kept.push((key, attr.value.into_owned()));
                continue;
            };

            let uri = unescape(std::str::from_utf8(&attr.value)?)?.into_owned();
            let binding = match self.prefixes.get(&uri) {
                Some(target) => Binding::Mapped(target.clone()),
                None => {
                    kept.push((key, attr.value.into_owned()));
                    Binding::Foreign
                }
            };
            match declared {
                Some(prefix) => scope.prefixes.push((prefix, binding)),
                None => scope.default = Some(binding),
            }
        }

        let is_root = self.stack.is_empty();
        self.stack.push(scope);

        let name = match self.stack.last() {
            Some(scope) => self.rewrite(&scope.source, true),
            None => return Err(PrefixError::Malformed("empty scope stack".to_string())),
        };
        let mut tag = BytesStart::new(name.clone());

        if is_root {
            for (uri, prefix) in &self.prefixes {
                let key = format!("xmlns:{}", prefix);
                tag.push_attribute((key.as_str(), uri.as_str()));
            }
        }

        for (key, value) in &kept {
            let key = if key == "xmlns" || key.starts_with("xmlns:") {
                key.clone()
            } else {
                self.rewrite(key, false)
            };
            tag.push_attribute(Attribute {
                key: QName(key.as_bytes()),
                value: requote(value),
            });
        }

        if let Some(scope) = self.stack.last_mut() {
            scope.name = name;
        }
        Ok(tag)
    }

    fn pop(&mut self, end: &BytesEnd<'_>) -> Result<BytesEnd<'static>, PrefixError> {
        let raw = std::str::from_utf8(end.name().as_ref())?.to_string();
        match self.stack.pop() {
            Some(scope) if scope.source == raw => Ok(BytesEnd::new(scope.name)),
            _ => Err(PrefixError::UnmatchedEnd(raw)),
        }
    }
}

impl<W: Write> Write for Prefixer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(reason) = &self.failed {
            return Err(PrefixError::Failed(reason.clone()).into());
        }
        self.pending.extend_from_slice(buf);

        match self.process(false) {
            Ok(()) => Ok(buf.len()),
            Err(e) => {
                self.failed = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.get_mut().flush()
    }
}

/// Les valeurs brutes sont réécrites entre guillemets doubles : une valeur
/// lue entre apostrophes peut contenir `"`.
fn requote(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.contains(&b'"') {
        return Cow::Borrowed(raw);
    }
    let mut out = Vec::with_capacity(raw.len() + 8);
    for &b in raw {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

/// Longueur du plus long préfixe de `buf` composé de jetons complets.
///
/// Un texte n'est complet que lorsque le `<` qui le suit est arrivé ; une
/// balise, un commentaire, une section CDATA ou une instruction quand son
/// délimiteur fermant est présent.
fn complete_prefix(buf: &[u8]) -> usize {
    let mut done = 0;
    let mut i = 0;
    while i < buf.len() {
        let advance = if buf[i] == b'<' {
            markup_len(&buf[i..])
        } else {
            buf[i..].iter().position(|&b| b == b'<')
        };
        match advance {
            Some(n) => {
                i += n;
                done = i;
            }
            None => break,
        }
    }
    done
}

fn markup_len(buf: &[u8]) -> Option<usize> {
    const COMMENT: &[u8] = b"<!--";
    const CDATA: &[u8] = b"<![CDATA[";

    // Ouvrant encore ambigu
    if buf.len() < CDATA.len() && (COMMENT.starts_with(buf) || CDATA.starts_with(buf)) {
        return None;
    }
    if buf.starts_with(COMMENT) {
        return find_after(buf, COMMENT.len(), b"-->");
    }
    if buf.starts_with(CDATA) {
        return find_after(buf, CDATA.len(), b"]]>");
    }
    if buf.starts_with(b"<?") {
        return find_after(buf, 2, b"?>");
    }

    // Balise ou DOCTYPE : '>' hors guillemets et hors sous-ensemble interne
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    for (i, &b) in buf.iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(i + 1),
                _ => {}
            },
        }
    }
    None
}

fn find_after(buf: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    buf.get(from..)?
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|p| from + p + pattern.len())
}
