use serde::Serialize;

/// Exception details of the exception in a chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception type name.
    pub type_name: String,

    /// Exception message.
    pub message: String,

    /// Indicates if full exception stack is provided in the exception. The stack may be trimmed,
    /// such as in the case of a StackOverflow exception.
    pub has_full_stack: bool,

    /// Text describing the stack. Either stack or parsedStack should have a value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}
