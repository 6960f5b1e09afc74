/// Errors raised while building a schema.
///
/// Parse-time failures are reported as `valkit_issue::ParseError`; these are
/// mistakes in the schema definition itself.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Two members of a discriminated union claim the same discriminator value.
    #[error("duplicate discriminator value {value} for key {key:?}")]
    DuplicateDiscriminator { key: String, value: String },

    /// A discriminated union member has no literal or enum at the discriminator key.
    #[error("member {index} has no literal or enum field {key:?}")]
    MissingDiscriminator { key: String, index: usize },

    /// A key passed to pick/omit/partial/required/alias is not declared.
    #[error("unknown key {0:?}")]
    UnknownKey(String),

    /// A user-supplied regular expression failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// An object-only operation was applied to a schema that is not an object.
    #[error("schema is not an object (found {0})")]
    NotAnObject(&'static str),

    /// A value passed to extract/exclude is not one of the enum's options.
    #[error("unknown enum value {0}")]
    UnknownValue(String),

    /// An enum-only operation was applied to a schema that is not an enum.
    #[error("schema is not an enum (found {0})")]
    NotAnEnum(&'static str),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
