//!
//! # Layout Result and Error Types
//!

// Local Imports
use crate::data::{CellKey, ElementId, InstanceId, LabelId, NetId, PinId, ViaId};
use crate::utils;

/// # [LayoutError] Result Type
pub type LayoutResult<T> = Result<T, LayoutError>;

///
/// # Layout Error Enumeration
///
/// Document-model operations fail with the entity-not-found variants,
/// each carrying the missing id. Serialization and format conversion
/// fail with the IO-flavored variants; [LayoutError::Conversion] carries
/// the captured combined stdout/stderr of a failed external command.
///
pub enum LayoutError {
    /// Document-model target cell not found
    CellNotFound(CellKey),
    /// Shape-element not found within its cell
    ElementNotFound(ElementId),
    /// Via not found within its cell
    ViaNotFound(ViaId),
    /// Label not found within its cell
    LabelNotFound(LabelId),
    /// Pin not found within its cell
    PinNotFound(PinId),
    /// Instance not found within its cell
    InstanceNotFound(InstanceId),
    /// Net not found within its cell
    NetNotFound(NetId),
    /// Validation of input data
    Validation(String),
    /// Unsupported serialization or conversion format-tag
    UnsupportedFormat(String),
    /// External-command conversion failure, with captured process output
    Conversion { message: String, output: String },
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl LayoutError {
    /// Create a [LayoutError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [LayoutError::Str] variant from anything String-convertible
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
}
impl std::fmt::Debug for LayoutError {
    /// Display a [LayoutError]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LayoutError::CellNotFound(k) => write!(f, "Cell Not Found: {:?}", k),
            LayoutError::ElementNotFound(id) => write!(f, "Shape Not Found: {:?}", id),
            LayoutError::ViaNotFound(id) => write!(f, "Via Not Found: {:?}", id),
            LayoutError::LabelNotFound(id) => write!(f, "Label Not Found: {:?}", id),
            LayoutError::PinNotFound(id) => write!(f, "Pin Not Found: {:?}", id),
            LayoutError::InstanceNotFound(id) => write!(f, "Instance Not Found: {:?}", id),
            LayoutError::NetNotFound(id) => write!(f, "Net Not Found: {:?}", id),
            LayoutError::Validation(message) => write!(f, "Validation Error: {}", message),
            LayoutError::UnsupportedFormat(tag) => write!(f, "Unsupported Format: {}", tag),
            LayoutError::Conversion { message, output } => {
                write!(f, "Conversion Error: \n - {} \n - {}", message, output)
            }
            LayoutError::Boxed(err) => err.fmt(f),
            LayoutError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for LayoutError {
    /// Display a [LayoutError]
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<String> for LayoutError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for LayoutError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<std::io::Error> for LayoutError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<utils::ser::Error> for LayoutError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl<T: std::error::Error + Send + Sync + 'static> From<Box<T>> for LayoutError {
    fn from(e: Box<T>) -> Self {
        Self::Boxed(e)
    }
}
