//! Grammar-file productions.
//!
//! Each production builds CST nodes through the green-tree builder and
//! recovers locally: a broken construct becomes an `Error` node and the
//! parser resynchronizes at the nearest rule or section boundary.

use super::core::Parser;
use super::cst::SyntaxKind::*;
use super::cst::token_sets;

impl Parser<'_> {
    pub(super) fn parse_root(&mut self) {
        self.start_node(Root);

        self.parse_grammar_decl();
        self.parse_prequels();

        while !self.should_stop() {
            match self.peek() {
                KwMode => self.parse_mode_spec(),
                KwFragment | Ident => self.parse_rule_spec(),
                // A stray prequel after the first rule still parses, so the
                // semantic check can reject it with a proper message.
                KwOptions => self.parse_options_spec(),
                KwTokens => self.parse_tokens_spec(),
                KwChannels => self.parse_channels_spec(),
                KwImport => self.parse_import_spec(),
                At => self.parse_named_action(),
                _ => self.error_and_bump("expected a rule definition"),
            }
        }

        self.finish_node();
    }

    fn parse_grammar_decl(&mut self) {
        self.start_node(GrammarDecl);
        match self.peek() {
            KwLexer | KwParser => {
                self.bump_any();
                self.expect(KwGrammar, "'grammar'");
            }
            KwGrammar => {
                self.bump_any();
            }
            _ => self.error_msg("expected grammar declaration"),
        }
        self.expect(Ident, "grammar name");
        self.expect(Semi, "';'");
        self.finish_node();
    }

    fn parse_prequels(&mut self) {
        loop {
            match self.peek() {
                KwOptions => self.parse_options_spec(),
                KwTokens => self.parse_tokens_spec(),
                KwChannels => self.parse_channels_spec(),
                KwImport => self.parse_import_spec(),
                At => self.parse_named_action(),
                _ => break,
            }
        }
    }

    fn parse_options_spec(&mut self) {
        self.start_node(OptionsSpec);
        self.bump_any(); // options
        self.expect(LBrace, "'{'");
        while self.peek().is_ident_like() {
            self.parse_option_def();
        }
        self.expect(RBrace, "'}'");
        self.finish_node();
    }

    fn parse_option_def(&mut self) {
        self.start_node(OptionDef);
        self.bump_any(); // name
        self.expect(Equals, "'='");
        match self.peek() {
            Ident | StringLiteral | Int => self.bump_any(),
            k if k.is_keyword() => self.bump_any(),
            _ => self.error_msg("expected option value"),
        }
        self.expect(Semi, "';'");
        self.finish_node();
    }

    fn parse_tokens_spec(&mut self) {
        self.start_node(TokensSpec);
        self.bump_any(); // tokens
        self.expect(LBrace, "'{'");
        self.parse_ident_list(RBrace);
        self.expect(RBrace, "'}'");
        self.finish_node();
    }

    fn parse_channels_spec(&mut self) {
        self.start_node(ChannelsSpec);
        self.bump_any(); // channels
        self.expect(LBrace, "'{'");
        self.parse_ident_list(RBrace);
        self.expect(RBrace, "'}'");
        self.finish_node();
    }

    /// `name (, name)*` with a tolerated trailing comma, up to `close`.
    fn parse_ident_list(&mut self, close: super::cst::SyntaxKind) {
        while !self.should_stop() {
            match self.peek() {
                Ident => self.bump_any(),
                Comma => self.bump_any(),
                k if k == close => break,
                _ => {
                    self.error_and_bump("expected identifier");
                }
            }
        }
    }

    fn parse_import_spec(&mut self) {
        self.start_node(ImportSpec);
        self.bump_any(); // import
        self.expect(Ident, "grammar name");
        while self.peek() == Comma {
            self.bump_any();
            self.expect(Ident, "grammar name");
        }
        self.expect(Semi, "';'");
        self.finish_node();
    }

    fn parse_named_action(&mut self) {
        self.start_node(NamedAction);
        self.bump_any(); // @
        if self.peek().is_ident_like() {
            self.bump_any(); // scope or name
            if self.peek() == DoubleColon {
                self.bump_any();
                if self.peek().is_ident_like() {
                    self.bump_any();
                } else {
                    self.error_msg("expected action name");
                }
            }
        } else {
            self.error_msg("expected action name");
        }
        self.expect(Action, "action body");
        self.finish_node();
    }

    fn parse_mode_spec(&mut self) {
        self.start_node(ModeSpec);
        self.bump_any(); // mode
        self.expect(Ident, "mode name");
        self.expect(Semi, "';'");
        while !self.should_stop() {
            match self.peek() {
                KwFragment | Ident => self.parse_rule_spec(),
                KwMode => break,
                _ => break,
            }
        }
        self.finish_node();
    }

    fn parse_rule_spec(&mut self) {
        let fragment = self.peek() == KwFragment;
        let lexer_rule = fragment
            || self
                .current_text()
                .chars()
                .next()
                .is_some_and(char::is_uppercase);
        if lexer_rule {
            self.parse_lexer_rule(fragment);
        } else {
            self.parse_parser_rule();
        }
    }

    fn parse_lexer_rule(&mut self, fragment: bool) {
        self.start_node(LexerRule);
        if fragment {
            self.bump_any(); // fragment
        }
        self.expect(Ident, "rule name");
        if self.peek() == KwOptions {
            self.parse_options_spec();
        }
        self.expect(Colon, "':'");
        self.parse_rule_block();
        self.expect(Semi, "';'");
        self.finish_node();
    }

    fn parse_parser_rule(&mut self) {
        self.start_node(ParserRule);
        self.expect(Ident, "rule name");
        if self.peek() == BracketBlock {
            self.start_node(ArgsSpec);
            self.bump_any();
            self.finish_node();
        }
        if self.peek() == KwReturns {
            self.start_node(ReturnsSpec);
            self.bump_any();
            self.expect(BracketBlock, "return value declarations");
            self.finish_node();
        }
        if self.peek() == KwLocals {
            self.start_node(LocalsSpec);
            self.bump_any();
            self.expect(BracketBlock, "local declarations");
            self.finish_node();
        }
        while self.peek() == KwOptions {
            self.parse_options_spec();
        }
        self.expect(Colon, "':'");
        self.parse_rule_block();
        self.expect(Semi, "';'");
        self.finish_node();
    }

    pub(super) fn parse_rule_block(&mut self) {
        self.start_node(RuleBlock);
        self.parse_alt();
        while self.peek() == Pipe {
            self.bump_any();
            self.parse_alt();
        }
        self.finish_node();
    }

    fn parse_alt(&mut self) {
        self.start_node(Alt);
        if self.peek() == Lt {
            self.parse_element_options();
        }
        loop {
            let kind = self.peek();
            if token_sets::ELEMENT_FIRST.contains(kind) && kind != Lt {
                self.parse_element();
            } else if kind == Pound {
                self.parse_alt_label();
            } else if kind == Arrow {
                self.parse_lexer_commands();
            } else if matches!(kind, Pipe | Semi | RParen) || self.should_stop() {
                break;
            } else {
                self.error_recover("unexpected token in alternative", token_sets::RULE_RECOVERY);
                break;
            }
        }
        self.finish_node();
    }

    fn parse_alt_label(&mut self) {
        self.start_node(AltLabel);
        self.bump_any(); // #
        if self.peek().is_ident_like() {
            self.bump_any();
        } else {
            self.error_msg("expected alternative label");
        }
        self.finish_node();
    }

    fn parse_element(&mut self) {
        // `x=...` / `x+=...` element labels.
        if self.peek() == Ident && matches!(self.peek_nth(1), Equals | PlusEquals) {
            let checkpoint = self.checkpoint();
            self.bump_any(); // label
            self.bump_any(); // = or +=
            self.parse_quantified_atom();
            self.start_node_at(checkpoint, Labeled);
            self.finish_node();
            return;
        }

        if self.peek() == Action {
            let checkpoint = self.checkpoint();
            self.bump_any();
            if self.peek() == Question {
                self.bump_any();
                self.start_node_at(checkpoint, PredicateExpr);
            } else {
                self.start_node_at(checkpoint, ActionExpr);
            }
            self.finish_node();
            return;
        }

        self.parse_quantified_atom();
    }

    fn parse_quantified_atom(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_atom_or_block();
        if token_sets::QUANTIFIERS.contains(self.peek()) {
            self.start_node_at(checkpoint, Ebnf);
            self.bump_any();
            self.finish_node();
        }
    }

    fn parse_atom_or_block(&mut self) {
        match self.peek() {
            LParen => {
                if !self.enter_recursion() {
                    return;
                }
                self.start_node(Block);
                self.bump_any(); // (
                self.parse_rule_block();
                self.expect(RParen, "')'");
                self.finish_node();
                self.exit_recursion();
            }
            Tilde => {
                self.start_node(NotExpr);
                self.bump_any(); // ~
                self.parse_atom_or_block();
                self.finish_node();
            }
            Dot => {
                self.start_node(Atom);
                self.bump_any();
                if self.peek() == Lt {
                    self.parse_element_options();
                }
                self.finish_node();
            }
            BracketBlock => {
                self.start_node(Atom);
                self.bump_any();
                self.finish_node();
            }
            StringLiteral => {
                let checkpoint = self.checkpoint();
                self.bump_any();
                if self.peek() == DotDot {
                    self.start_node_at(checkpoint, RangeExpr);
                    self.bump_any();
                    self.expect(StringLiteral, "range upper bound");
                    self.finish_node();
                } else {
                    self.start_node_at(checkpoint, Atom);
                    if self.peek() == Lt {
                        self.parse_element_options();
                    }
                    self.finish_node();
                }
            }
            Ident => {
                let lowercase = self
                    .current_text()
                    .chars()
                    .next()
                    .is_some_and(char::is_lowercase);
                self.start_node(Atom);
                self.bump_any();
                // Rule references may pass arguments: `expr[5]`.
                if lowercase && self.peek() == BracketBlock {
                    self.start_node(ArgsSpec);
                    self.bump_any();
                    self.finish_node();
                }
                if self.peek() == Lt {
                    self.parse_element_options();
                }
                self.finish_node();
            }
            _ => self.error_and_bump("expected an element"),
        }
    }

    fn parse_element_options(&mut self) {
        self.start_node(ElementOptions);
        self.bump_any(); // <
        while !self.should_stop() {
            match self.peek() {
                Gt => break,
                Comma => self.bump_any(),
                k if k.is_ident_like() => {
                    self.start_node(ElementOption);
                    self.bump_any();
                    if self.peek() == Equals {
                        self.bump_any();
                        match self.peek() {
                            StringLiteral | Int => self.bump_any(),
                            k if k.is_ident_like() => self.bump_any(),
                            _ => self.error_msg("expected option value"),
                        }
                    }
                    self.finish_node();
                }
                _ => {
                    self.error_and_bump("expected element option");
                }
            }
        }
        self.expect(Gt, "'>'");
        self.finish_node();
    }

    fn parse_lexer_commands(&mut self) {
        self.start_node(LexerCommands);
        self.bump_any(); // ->
        self.parse_lexer_command();
        while self.peek() == Comma {
            self.bump_any();
            self.parse_lexer_command();
        }
        self.finish_node();
    }

    fn parse_lexer_command(&mut self) {
        self.start_node(LexerCommand);
        if self.peek().is_ident_like() {
            self.bump_any();
            if self.peek() == LParen {
                self.bump_any();
                match self.peek() {
                    Ident | Int => self.bump_any(),
                    _ => self.error_msg("expected command argument"),
                }
                self.expect(RParen, "')'");
            }
        } else {
            self.error_msg("expected lexer command");
        }
        self.finish_node();
    }
}
