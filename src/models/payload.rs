use zeroize::Zeroizing;

/// How a payload fragment reaches the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Persist to the named file.
    Store { filename: String },
    /// Emit as text on the output channel; never written to disk.
    Show,
}

/// A single deliverable fragment produced by `Credential::get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub description: String,
    pub disposition: Disposition,
    pub data: Zeroizing<Vec<u8>>,
}

impl Payload {
    pub fn store(description: &str, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            description: description.to_string(),
            disposition: Disposition::Store {
                filename: filename.into(),
            },
            data: Zeroizing::new(data),
        }
    }

    pub fn show(description: &str, data: Vec<u8>) -> Self {
        Self {
            description: description.to_string(),
            disposition: Disposition::Show,
            data: Zeroizing::new(data),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match &self.disposition {
            Disposition::Store { filename } => Some(filename),
            Disposition::Show => None,
        }
    }
}
