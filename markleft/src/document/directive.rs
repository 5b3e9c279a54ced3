/// Directive keys the compiler gives meaning to.
///
/// Keys are case-sensitive. `task` is accepted as an alias of `title`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    // Metadata: describe the task, never rendered as body content.
    Title,
    Instructions,
    Steps,
    Memory,
    Checker,
    Solution,
    Generator,
    Lua,

    // Content.
    Section,
    Paragraph,
    Quote,
    Code,
    Math,
    Image,
    Example,
    Input,
    Output,
    Ordered,
    Unordered,
    Item,
}

const KEYS: &[(&str, DirectiveKind)] = &[
    ("title", DirectiveKind::Title),
    ("task", DirectiveKind::Title),
    ("instructions", DirectiveKind::Instructions),
    ("steps", DirectiveKind::Steps),
    ("memory", DirectiveKind::Memory),
    ("checker", DirectiveKind::Checker),
    ("solution", DirectiveKind::Solution),
    ("generator", DirectiveKind::Generator),
    ("lua", DirectiveKind::Lua),
    ("section", DirectiveKind::Section),
    ("paragraph", DirectiveKind::Paragraph),
    ("quote", DirectiveKind::Quote),
    ("code", DirectiveKind::Code),
    ("math", DirectiveKind::Math),
    ("image", DirectiveKind::Image),
    ("example", DirectiveKind::Example),
    ("input", DirectiveKind::Input),
    ("output", DirectiveKind::Output),
    ("ordered", DirectiveKind::Ordered),
    ("unordered", DirectiveKind::Unordered),
    ("item", DirectiveKind::Item),
];

impl DirectiveKind {
    pub fn from_key(key: &str) -> Option<DirectiveKind> {
        KEYS.iter().find(|(k, _)| *k == key).map(|(_, kind)| *kind)
    }

    /// Canonical key used in messages.
    pub fn name(self) -> &'static str {
        KEYS.iter()
            .find(|(_, kind)| *kind == self)
            .map(|(k, _)| *k)
            .unwrap_or("?")
    }

    pub fn is_metadata(self) -> bool {
        matches!(
            self,
            DirectiveKind::Title
                | DirectiveKind::Instructions
                | DirectiveKind::Steps
                | DirectiveKind::Memory
                | DirectiveKind::Checker
                | DirectiveKind::Solution
                | DirectiveKind::Generator
                | DirectiveKind::Lua
        )
    }

    /// Verbatim directives keep their value as raw text: no inline marks,
    /// line structure preserved.
    pub fn is_verbatim(self) -> bool {
        matches!(
            self,
            DirectiveKind::Code
                | DirectiveKind::Math
                | DirectiveKind::Input
                | DirectiveKind::Output
                | DirectiveKind::Checker
                | DirectiveKind::Solution
                | DirectiveKind::Generator
                | DirectiveKind::Lua
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            DirectiveKind::Instructions | DirectiveKind::Steps | DirectiveKind::Memory
        )
    }

    /// Directives whose body is rich text only.
    pub fn is_text_only(self) -> bool {
        matches!(
            self,
            DirectiveKind::Title | DirectiveKind::Section | DirectiveKind::Paragraph
        )
    }

    pub fn is_list(self) -> bool {
        matches!(self, DirectiveKind::Ordered | DirectiveKind::Unordered)
    }

    /// Metadata scoped per locale rather than per document.
    pub fn is_localized(self) -> bool {
        self == DirectiveKind::Title
    }
}

/// Whether `.key` opens a verbatim block. The lexer switches to raw mode on
/// these.
pub fn is_verbatim_key(key: &str) -> bool {
    DirectiveKind::from_key(key).is_some_and(DirectiveKind::is_verbatim)
}
