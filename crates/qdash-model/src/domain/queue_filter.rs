use crate::error::ModelError;

/// Ordered set of queue names restricting a metrics request.
///
/// An empty filter means "all queues".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFilter {
    names: Vec<String>,
}

impl QueueFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses the comma-separated `queues` request parameter.
    ///
    /// Blank segments are skipped and repeated names keep their first position.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        Self::from_names(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name.chars().any(char::is_control) {
                return Err(ModelError::InvalidParameter {
                    param: "queues",
                    value: name,
                });
            }
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Ok(Self { names: out })
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
