/// Command run by the host when the user accepts the quick-fix.
pub const DECLARE_UNDEFINED_COMPONENT: &str = "react-refactor-tool.declare-undefined-component";

/// Title shown for the quick-fix and its command.
pub const DECLARE_COMPONENT_TITLE: &str = "Declare component with function declaration";

/// TypeScript's "Cannot find name" diagnostic code.
pub const UNDEFINED_NAME_CODE: i32 = 2304;

/// Language identifiers the code-action provider is registered for.
pub const LANGUAGE_IDS: [&str; 4] = [
    "typescript",
    "javascript",
    "typescriptreact",
    "javascriptreact",
];

/// Only documents backed by a file take part.
pub const DOCUMENT_SCHEME: &str = "file";

pub const SERVER_NAME: &str = "react-refactor";

pub const CONFIG_FILE_NAME: &str = "react-refactor.toml";

/// Whether `language_id` is one the provider serves.
pub fn is_supported_language(language_id: &str) -> bool {
    LANGUAGE_IDS.contains(&language_id)
}
