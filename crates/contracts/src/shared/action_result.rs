use serde::{Deserialize, Serialize};

/// Error category visible to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing/invalid session or expired external credential ("sign in again")
    Auth,
    /// External system returned an unexpected shape or a non-success code (retryable)
    Api,
    /// Size or shape constraint violated by the input
    Validation,
    /// Lookup miss
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Api => "api",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Api)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Tagged success/failure envelope returned by every action endpoint.
///
/// ```json
/// {"success": true, "data": {...}}
/// {"success": false, "error": {"kind": "validation", "message": "..."}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResult<T> {
    Ok { success: Success, data: T },
    Err { success: Failure, error: ActionError },
}

/// Literal `true` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Success;

/// Literal `false` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Failure;

macro_rules! bool_tag {
    ($ty:ident, $value:expr) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_bool($value)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let v = bool::deserialize(d)?;
                if v == $value {
                    Ok($ty)
                } else {
                    Err(serde::de::Error::custom(concat!("expected success=", stringify!($value))))
                }
            }
        }
    };
}

bool_tag!(Success, true);
bool_tag!(Failure, false);

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        ActionResult::Ok {
            success: Success,
            data,
        }
    }

    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        ActionResult::Err {
            success: Failure,
            error: ActionError {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok { .. })
    }

    pub fn into_result(self) -> Result<T, ActionError> {
        match self {
            ActionResult::Ok { data, .. } => Ok(data),
            ActionResult::Err { error, .. } => Err(error),
        }
    }
}
