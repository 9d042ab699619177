//! The diagnostic catalog.
//!
//! Every condition the pipeline can report is one variant here, carrying a
//! stable numeric code, a severity, and a message template with positional
//! `{0}`/`{1}` placeholders.

/// Severity attached to a [`DiagnosticKind`].
///
/// The `*OneOff` severities report like their base severity but are
/// suppressed after the first occurrence of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    Info,
    Warning,
    WarningOneOff,
    #[default]
    Error,
    ErrorOneOff,
    Fatal,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::ErrorOneOff | Severity::Fatal)
    }

    pub fn is_warning(self) -> bool {
        matches!(self, Severity::Warning | Severity::WarningOneOff)
    }

    pub fn is_one_off(self) -> bool {
        matches!(self, Severity::WarningOneOff | Severity::ErrorOneOff)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning | Severity::WarningOneOff => "warning",
            Severity::Error | Severity::ErrorOneOff => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

macro_rules! diagnostic_kinds {
    ($( $variant:ident = ($code:literal, $severity:ident, $template:literal), )*) => {
        /// Closed catalog of everything the compiler can report.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DiagnosticKind {
            $( $variant, )*
        }

        impl DiagnosticKind {
            pub fn code(self) -> u16 {
                match self {
                    $( DiagnosticKind::$variant => $code, )*
                }
            }

            pub fn severity(self) -> Severity {
                match self {
                    $( DiagnosticKind::$variant => Severity::$severity, )*
                }
            }

            pub fn template(self) -> &'static str {
                match self {
                    $( DiagnosticKind::$variant => $template, )*
                }
            }
        }
    };
}

diagnostic_kinds! {
    // Internal / I-O
    InternalError = (1, Fatal, "internal error: {0}"),
    SerializationFailed = (2, Fatal, "cannot write serialized output: {0}"),
    CannotFindImportedGrammar = (3, Error, "cannot find or load imported grammar {0}"),

    // Syntax
    SyntaxError = (50, Error, "{0}"),

    // Declarations
    RuleRedefinition = (51, Error, "rule {0} redefined"),
    ReservedRuleName = (52, Error, "cannot declare a rule with reserved name {0}"),
    RepeatedPrequel = (53, Error, "repeated grammar prequel spec ({0}); please merge"),
    ActionRedefinition = (54, Error, "redefinition of {0} action"),
    ModeWithoutRules = (55, Error, "lexer mode {0} must contain at least one non-fragment rule"),
    EpsilonToken = (56, Warning, "non-fragment lexer rule {0} can match the empty string"),
    TokenNamesMustStartUpper = (57, Error, "token names must start with an uppercase letter: {0}"),

    // References
    UndefinedRuleRef = (60, Error, "reference to undefined rule: {0}"),
    RuleHasNoArgs = (61, Error, "rule {0} has no defined parameters"),
    MissingRuleArgs = (62, Error, "missing argument(s) on rule reference: {0}"),
    UnknownLexerConstant = (63, Error, "{0} is not a recognized name in lexer command {1}"),

    // Options
    IllegalOption = (70, Warning, "unsupported option {0}"),
    IllegalOptionValue = (71, Warning, "unsupported option value {0}={1}"),
    OptionsInDelegate = (72, WarningOneOff, "options ignored in imported grammar {0}"),
    RedundantCaseInsensitiveLexerRuleOption =
        (73, Warning, "caseInsensitive lexer rule option is redundant: the grammar already defaults to {0}"),

    // Labels and attribute declarations
    LabelConflictsWithRule = (80, Error, "label {0} conflicts with rule with same name"),
    LabelConflictsWithToken = (81, Error, "label {0} conflicts with token with same name"),
    LabelConflictsWithArg = (82, Error, "label {0} conflicts with parameter with same name"),
    LabelConflictsWithRetval = (83, Error, "label {0} conflicts with return value with same name"),
    LabelConflictsWithLocal = (84, Error, "label {0} conflicts with local with same name"),
    LabelTypeConflict = (85, Error, "label {0} type mismatch with previous definition: {1}"),
    LabelBlockNotASet = (86, Error, "label {0} assigned to a block which is not a set"),
    ArgConflictsWithRule = (87, Error, "parameter {0} conflicts with rule with same name"),
    RetvalConflictsWithRule = (88, Error, "return value {0} conflicts with rule with same name"),
    LocalConflictsWithRule = (89, Error, "local {0} conflicts with rule with same name"),
    RetvalConflictsWithArg = (90, Error, "return value {0} conflicts with parameter with same name"),
    LocalConflictsWithArg = (91, Error, "local {0} conflicts with parameter with same name"),
    LocalConflictsWithRetval = (92, Error, "local {0} conflicts with return value with same name"),

    // Attribute expressions
    UnknownSimpleAttribute = (95, Error, "unknown attribute reference {0} in {1}"),
    UnknownRuleAttribute = (96, Error, "unknown attribute {0} for rule {1} in {2}"),

    // Token definitions
    ImplicitTokenDefinition = (100, Warning, "implicit definition of token {0} in parser"),
    ImplicitStringDefinition =
        (101, Error, "cannot create implicit token for string literal in non-combined grammar: {0}"),
    TokenNameReassignment = (102, Warning, "token name {0} is already defined"),

    // Channels and modes
    ChannelConflictsWithCommonConstants =
        (105, Error, "cannot use or declare channel with reserved name {0}"),
    ChannelConflictsWithToken = (106, Error, "channel {0} conflicts with token with same name"),
    ChannelConflictsWithMode = (107, Error, "channel {0} conflicts with mode with same name"),
    ModeConflictsWithCommonConstants =
        (108, Error, "cannot use or declare mode with reserved name {0}"),
    ModeConflictsWithToken = (109, Error, "mode {0} conflicts with token with same name"),
    ChannelsOnlyInLexer = (110, Error, "custom channels are only valid in lexer grammars"),

    // Lexer analysis
    TokenUnreachable = (115, Warning, "token {0} is unreachable: {1} is always matched by {2}"),
    CharactersCollisionInSet = (116, Warning, "chars {0} used multiple times in set {1}"),
    RangeProbablyContainsNotImpliedCharacters =
        (117, Warning, "range {0}..{1} probably contains characters that were not implied; both bounds should be of the same case"),
    IncompatibleCommands = (118, Error, "lexer command {0} is incompatible with {1}"),
    DuplicatedCommand = (119, Warning, "duplicated lexer command {0}"),

    // Left recursion
    LeftRecursionCycles = (123, Error, "the following sets of rules are mutually left-recursive: {0}"),

    // Promotion
    WarningTreatedAsError = (200, Error, "warning treated as error"),
}

impl DiagnosticKind {
    /// Render the template with positional arguments substituted.
    pub fn render(self, args: &[String]) -> String {
        let mut out = self.template().to_owned();
        for (i, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{i}}}"), arg);
        }
        out
    }
}
