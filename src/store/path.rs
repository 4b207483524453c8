use std::fmt;

use super::StoreError;

fn valid_segments(s: &str) -> Option<usize> {
    let segs: Vec<&str> = s.split('/').collect();
    if segs.iter().any(|seg| seg.is_empty()) {
        return None;
    }
    Some(segs.len())
}

/// Path of a single document: an even number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

/// Path of a collection: an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl DocPath {
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match valid_segments(s) {
            Some(n) if n % 2 == 0 => Ok(Self(s.to_string())),
            _ => Err(StoreError::InvalidPath(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn collection(&self) -> CollectionPath {
        let cut = self.0.rfind('/').unwrap_or(0);
        CollectionPath(self.0[..cut].to_string())
    }
}

impl CollectionPath {
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match valid_segments(s) {
            Some(n) if n % 2 == 1 => Ok(Self(s.to_string())),
            _ => Err(StoreError::InvalidPath(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: &str) -> Result<DocPath, StoreError> {
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::InvalidPath(format!("{}/{}", self.0, id)));
        }
        Ok(DocPath(format!("{}/{}", self.0, id)))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Namespace of everything one user of one app instance owns:
/// `artifacts/{app_id}/users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    app_id: String,
    uid: String,
}

/// Whether `uid` can name a scope as-is: one non-empty path segment.
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.trim().is_empty() && !uid.contains('/')
}

fn clean_segment(s: &str) -> String {
    let s = s.replace('/', "_");
    if s.is_empty() { "_".to_string() } else { s }
}

impl Scope {
    pub fn new(app_id: &str, uid: &str) -> Self {
        Self {
            app_id: clean_segment(app_id),
            uid: clean_segment(uid),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    fn root(&self) -> String {
        format!("artifacts/{}/users/{}", self.app_id, self.uid)
    }

    fn fixed_doc(&self, collection: &str, id: &str) -> DocPath {
        DocPath(format!("{}/{collection}/{id}", self.root()))
    }

    pub fn account_list(&self) -> DocPath {
        self.fixed_doc("emailAccounts", "list")
    }

    pub fn logs(&self) -> CollectionPath {
        CollectionPath(format!("{}/logs", self.root()))
    }

    pub fn log(&self, timestamp: i64) -> DocPath {
        self.log_entry(&timestamp.to_string())
    }

    pub fn log_entry(&self, id: &str) -> DocPath {
        self.fixed_doc("logs", id)
    }

    pub fn stats(&self) -> DocPath {
        self.fixed_doc("dashboard", "stats")
    }

    pub fn warmup_settings(&self) -> DocPath {
        self.fixed_doc("settings", "warmup")
    }
}
