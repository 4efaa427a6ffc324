use thiserror::Error;

/// Result type alias using AssocError
pub type Result<T> = std::result::Result<T, AssocError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Declaration/Configuration
    InvalidInput,
    AlreadyExists,
    UnknownType,
    UnknownAssociation,
    UnknownAttribute,
    InvalidManifest,

    // Assignment
    TypeMismatch,

    // Lookup
    NotFound,

    // Destroy
    RestrictedReference,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::UnknownType => "ERR_UNKNOWN_TYPE",
            ExErrorKind::UnknownAssociation => "ERR_UNKNOWN_ASSOCIATION",
            ExErrorKind::UnknownAttribute => "ERR_UNKNOWN_ATTRIBUTE",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::RestrictedReference => "ERR_RESTRICTED_REFERENCE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and record
/// context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    record_type: Option<String>,
    record_id: Option<String>,
    association: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            record_type: None,
            record_id: None,
            association: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add record type context
    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Add record ID context
    pub fn with_record_id(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    /// Add association name context
    pub fn with_association(mut self, association: impl Into<String>) -> Self {
        self.association = Some(association.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn record_type(&self) -> Option<&str> {
        self.record_type.as_deref()
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn association(&self) -> Option<&str> {
        self.association.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(record_type) = &self.record_type {
            write!(f, " (record_type: {})", record_type)?;
        }
        if let Some(record_id) = &self.record_id {
            write!(f, " (record_id: {})", record_id)?;
        }
        if let Some(association) = &self.association {
            write!(f, " (association: {})", association)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for association declaration, resolution and cascades
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssocError {
    // ===== Assignment Errors =====
    /// A direct reference was assigned a record of an incompatible schema
    #[error("type mismatch on association {association}: {expected} != {actual}")]
    TypeMismatch {
        association: String,
        expected: String,
        actual: String,
    },

    // ===== Destroy Errors =====
    /// A restrict-with-exception reference still points at a live record
    #[error("{owner_type} instance {owner_id} maintains a restricted reference to {association}")]
    RecordExists {
        owner_type: String,
        association: String,
        owner_id: String,
    },

    // ===== Declaration Errors =====
    /// Association name declared twice on the same record type
    #[error("Association {association} is already declared on {type_name}")]
    DuplicateAssociation {
        type_name: String,
        association: String,
    },

    /// Record type registered twice in the same catalog
    #[error("Record type already registered: {type_name}")]
    DuplicateType { type_name: String },

    /// Declaration is malformed (empty names and the like)
    #[error("Invalid declaration on {type_name}: {reason}")]
    InvalidDeclaration { type_name: String, reason: String },

    // ===== Lookup Errors =====
    /// Association name is not declared on the record type
    #[error("Association {association} is not declared on {type_name}")]
    UnknownAssociation {
        type_name: String,
        association: String,
    },

    /// Field is not declared on the record type
    #[error("Attribute {field} is not declared on {type_name}")]
    UnknownAttribute { type_name: String, field: String },

    /// Record type is not registered in the catalog
    #[error("Unknown record type: {type_name}")]
    UnknownType { type_name: String },

    /// Record lookup failed outside quiet mode
    #[error("{type_name} not found: {id}")]
    RecordNotFound { type_name: String, id: String },

    // ===== Manifest Errors =====
    /// Declaration manifest failed to parse or validate
    #[error("Invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    // ===== Generic Errors =====
    /// Collaborator store failure
    #[error("Store error: {message}")]
    Store { message: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<AssocError> for ExError {
    fn from(err: AssocError) -> Self {
        match err {
            AssocError::TypeMismatch {
                association,
                expected,
                actual,
            } => ExError::new(ExErrorKind::TypeMismatch)
                .with_op("set")
                .with_association(association)
                .with_message(format!("Expected schema {}, got {}", expected, actual)),

            AssocError::RecordExists {
                owner_type,
                association,
                owner_id,
            } => ExError::new(ExErrorKind::RestrictedReference)
                .with_op("destroy_associations")
                .with_record_type(owner_type)
                .with_record_id(owner_id)
                .with_association(association)
                .with_message("Record maintains a restricted reference"),

            AssocError::DuplicateAssociation {
                type_name,
                association,
            } => ExError::new(ExErrorKind::AlreadyExists)
                .with_op("declare")
                .with_record_type(type_name)
                .with_association(association)
                .with_message("Association already declared"),

            AssocError::DuplicateType { type_name } => ExError::new(ExErrorKind::AlreadyExists)
                .with_op("register")
                .with_record_type(type_name)
                .with_message("Record type already registered"),

            AssocError::InvalidDeclaration { type_name, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("declare")
                    .with_record_type(type_name)
                    .with_message(reason)
            }

            AssocError::UnknownAssociation {
                type_name,
                association,
            } => ExError::new(ExErrorKind::UnknownAssociation)
                .with_record_type(type_name)
                .with_association(association)
                .with_message("Association not declared"),

            AssocError::UnknownAttribute { type_name, field } => {
                ExError::new(ExErrorKind::UnknownAttribute)
                    .with_record_type(type_name)
                    .with_message(format!("Attribute {} not declared", field))
            }

            AssocError::UnknownType { type_name } => ExError::new(ExErrorKind::UnknownType)
                .with_record_type(type_name)
                .with_message("Record type not registered"),

            AssocError::RecordNotFound { type_name, id } => ExError::new(ExErrorKind::NotFound)
                .with_record_type(type_name)
                .with_record_id(id)
                .with_message("Record not found"),

            AssocError::InvalidManifest { reason } => ExError::new(ExErrorKind::InvalidManifest)
                .with_op("parse_manifest")
                .with_message(reason),

            AssocError::Store { message } => {
                ExError::new(ExErrorKind::Persistence).with_message(message)
            }

            AssocError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            AssocError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to AssocError
impl From<serde_json::Error> for AssocError {
    fn from(err: serde_json::Error) -> Self {
        AssocError::Serialization {
            message: err.to_string(),
        }
    }
}
