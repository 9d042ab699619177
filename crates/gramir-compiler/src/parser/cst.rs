//! Syntax kinds for grammar source files.
//!
//! `SyntaxKind` serves dual roles: token kinds (from lexer) and node kinds
//! (from parser). Logos derives token recognition; node kinds lack
//! token/regex attributes. `GLang` implements Rowan's `Language` trait for
//! tree construction.

use logos::Logos;
use rowan::Language;

/// All token and node kinds. Tokens first, then nodes, then `__LAST`
/// sentinel. `#[repr(u16)]` enables safe transmute in `kind_from_raw`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Keywords come before `Ident` so they take precedence.
    #[token("lexer")]
    KwLexer = 0,

    #[token("parser")]
    KwParser,

    #[token("grammar")]
    KwGrammar,

    #[token("options")]
    KwOptions,

    #[token("tokens")]
    KwTokens,

    #[token("channels")]
    KwChannels,

    #[token("import")]
    KwImport,

    #[token("mode")]
    KwMode,

    #[token("fragment")]
    KwFragment,

    #[token("returns")]
    KwReturns,

    #[token("locals")]
    KwLocals,

    #[token(":")]
    Colon,

    #[token(";")]
    Semi,

    #[token("|")]
    Pipe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("=")]
    Equals,

    #[token("+=")]
    PlusEquals,

    #[token("->")]
    Arrow,

    #[token("~")]
    Tilde,

    /// Range operator in `'a'..'z'`.
    #[token("..")]
    DotDot,

    /// Wildcard.
    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    /// Non-greedy `*?` quantifier
    #[token("*?")]
    StarQuestion,

    /// Non-greedy `+?` quantifier
    #[token("+?")]
    PlusQuestion,

    /// Non-greedy `??` quantifier
    #[token("??")]
    QuestionQuestion,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token(",")]
    Comma,

    #[token("@")]
    At,

    #[token("::")]
    DoubleColon,

    /// Alternative label marker `# Name`.
    #[token("#")]
    Pound,

    /// Identifier; capitalization distinguishes token refs from rule refs,
    /// checked where the reference is resolved.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"'(?:[^'\\\n]|\\.)*'")]
    StringLiteral,

    /// `[...]` — a lexer character set or an argument action, decided by
    /// the production that consumes it.
    #[regex(r"\[(?:[^\]\\]|\\.)*\]")]
    BracketBlock,

    /// `{...}` with nested braces; a trailing `?` makes it a predicate.
    /// After `options`/`tokens`/`channels` the lexer wrapper re-splits the
    /// block into `LBrace` + interior tokens + `RBrace`.
    #[token("{", lex_action)]
    Action,

    LBrace,
    RBrace,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r\n")]
    Newline,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*(?:[^*]|\*[^/])*\*/")]
    BlockComment,

    /// Coalesced unrecognized characters
    Garbage,
    Error,

    // --- Node kinds (non-terminals) ---
    Root,
    GrammarDecl,
    OptionsSpec,
    OptionDef,
    TokensSpec,
    ChannelsSpec,
    ImportSpec,
    NamedAction,
    ModeSpec,
    ParserRule,
    LexerRule,
    ArgsSpec,
    ReturnsSpec,
    LocalsSpec,
    RuleBlock,
    Alt,
    AltLabel,
    Labeled,
    Ebnf,
    Block,
    RangeExpr,
    NotExpr,
    Atom,
    ElementOptions,
    ElementOption,
    LexerCommands,
    LexerCommand,
    PredicateExpr,
    ActionExpr,

    // Must be last - used for bounds checking in `kind_from_raw`
    #[doc(hidden)]
    __LAST,
}

/// Consume a `{...}` action with nested braces. Single- and double-quoted
/// strings inside the action may contain unbalanced braces.
fn lex_action(lex: &mut logos::Lexer<'_, SyntaxKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0usize;
    while i < rest.len() {
        match rest[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(i + 1);
                    return true;
                }
            }
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < rest.len() && rest[i] != quote {
                    if rest[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'\\' => i += 1,
            _ => {}
        }
        i += 1;
    }
    false
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | Newline | LineComment | BlockComment)
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            KwLexer
                | KwParser
                | KwGrammar
                | KwOptions
                | KwTokens
                | KwChannels
                | KwImport
                | KwMode
                | KwFragment
                | KwReturns
                | KwLocals
        )
    }

    /// Keywords double as plain identifiers in a few positions
    /// (option names, command names).
    #[inline]
    pub fn is_ident_like(self) -> bool {
        self == Ident || self.is_keyword()
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag for Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GLang {}

impl Language for GLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: We've verified the value is in bounds, and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for Rowan types parameterized by our language.
pub type SyntaxNode = rowan::SyntaxNode<GLang>;
pub type SyntaxToken = rowan::SyntaxToken<GLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

/// 64-bit bitset of token `SyntaxKind`s for O(1) membership testing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u64);

impl TokenSet {
    /// Panics at compile time if any kind's discriminant >= 64.
    #[inline]
    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 64, "SyntaxKind value exceeds TokenSet capacity");
            bits |= 1 << kind;
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        if kind >= 64 {
            return false;
        }
        self.0 & (1 << kind) != 0
    }

    #[inline]
    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }
}

/// Pre-defined token sets for the parser.
pub mod token_sets {
    use super::*;

    /// Tokens that can start an element inside an alternative.
    pub const ELEMENT_FIRST: TokenSet = TokenSet::new(&[
        Ident,
        StringLiteral,
        BracketBlock,
        LParen,
        Dot,
        Tilde,
        Action,
        Lt,
    ]);

    /// Tokens that can start a prequel section or a rule.
    pub const DECL_FIRST: TokenSet = TokenSet::new(&[
        KwOptions, KwTokens, KwChannels, KwImport, KwMode, KwFragment, At, Ident,
    ]);

    pub const QUANTIFIERS: TokenSet = TokenSet::new(&[
        Star,
        Plus,
        Question,
        StarQuestion,
        PlusQuestion,
        QuestionQuestion,
    ]);

    /// Recovery inside a rule body: stop at alternative or rule boundaries.
    pub const RULE_RECOVERY: TokenSet = TokenSet::new(&[Semi, Pipe, RParen]);

    /// Recovery inside prequel braces.
    pub const PREQUEL_RECOVERY: TokenSet = TokenSet::new(&[Semi, KwMode, KwFragment]);
}
