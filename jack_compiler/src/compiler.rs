//! Recursive-descent parser and code generator for one Jack class
//!
//! Emits VM command lines directly while parsing; no intermediate AST
//! is built, matching the course's suggested compilation engine design.

use crate::error::JackError;
use crate::symbol_table::{Kind, Scopes, SymbolEntry};
use crate::token::{Keyword, Token, Tokens};

pub struct Compiler<'a> {
    tokens: &'a [Token],
    lines: &'a [usize],
    pos: usize,
    scopes: Scopes,
    class_name: String,
    subroutine_name: String,
    label_counter: u32,
    output: Vec<String>,
}

impl<'a> Compiler<'a> {
    #[must_use]
    pub fn new(tokens: &'a Tokens) -> Self {
        Self {
            tokens: &tokens.tokens,
            lines: &tokens.lines,
            pos: 0,
            scopes: Scopes::new(),
            class_name: String::new(),
            subroutine_name: String::new(),
            label_counter: 0,
            output: Vec::new(),
        }
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    // --- token stream helpers ---

    fn current(&self) -> Result<Token, JackError> {
        self.tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| JackError::UnexpectedEof { expected: "more input".to_string() })
    }

    fn current_line(&self) -> usize {
        self.lines.get(self.pos).copied().unwrap_or(0)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn peek_is_symbol(&self, c: char) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Symbol(x)) if *x == c)
    }

    fn peek_is_keyword(&self, k: Keyword) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Keyword(x)) if *x == k)
    }

    fn peek_op_symbol(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token::Symbol(c)) if "+-*/&|<>=".contains(*c) => Some(*c),
            _ => None,
        }
    }

    fn expect_symbol(&mut self, expected: char) -> Result<(), JackError> {
        match self.current()? {
            Token::Symbol(c) if c == expected => {
                self.bump();
                Ok(())
            }
            other => Err(JackError::UnexpectedToken {
                line: self.current_line(),
                expected: format!("'{expected}'"),
                found: format!("{other:?}"),
            }),
        }
    }

    fn expect_keyword(&mut self, expected: Keyword) -> Result<(), JackError> {
        match self.current()? {
            Token::Keyword(k) if k == expected => {
                self.bump();
                Ok(())
            }
            other => Err(JackError::UnexpectedToken {
                line: self.current_line(),
                expected: format!("{expected:?}"),
                found: format!("{other:?}"),
            }),
        }
    }

    fn expect_identifier(&mut self) -> Result<String, JackError> {
        match self.current()? {
            Token::Identifier(name) => {
                self.bump();
                Ok(name)
            }
            other => Err(JackError::UnexpectedToken {
                line: self.current_line(),
                expected: "identifier".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    /// `type ::= 'int' | 'char' | 'boolean' | ident`
    fn expect_type(&mut self) -> Result<String, JackError> {
        match self.current()? {
            Token::Keyword(Keyword::Int) => {
                self.bump();
                Ok("int".to_string())
            }
            Token::Keyword(Keyword::Char) => {
                self.bump();
                Ok("char".to_string())
            }
            Token::Keyword(Keyword::Boolean) => {
                self.bump();
                Ok("boolean".to_string())
            }
            Token::Identifier(name) => {
                self.bump();
                Ok(name)
            }
            other => Err(JackError::UnexpectedToken {
                line: self.current_line(),
                expected: "a type".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn expect_return_type(&mut self) -> Result<(), JackError> {
        match self.current()? {
            Token::Keyword(Keyword::Void)
            | Token::Keyword(Keyword::Int)
            | Token::Keyword(Keyword::Char)
            | Token::Keyword(Keyword::Boolean)
            | Token::Identifier(_) => {
                self.bump();
                Ok(())
            }
            other => Err(JackError::UnexpectedToken {
                line: self.current_line(),
                expected: "'void' or a type".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn resolve_variable(&self, name: &str) -> Result<SymbolEntry, JackError> {
        self.scopes.resolve(name).cloned().ok_or_else(|| JackError::UnresolvedIdentifier {
            line: self.current_line(),
            name: name.to_string(),
        })
    }

    // --- emission helpers ---

    fn emit(&mut self, instruction: &str) {
        self.output.push(instruction.to_string());
    }

    fn emit_push(&mut self, segment: &str, index: u16) {
        self.output.push(format!("push {segment} {index}"));
    }

    fn emit_pop(&mut self, segment: &str, index: u16) {
        self.output.push(format!("pop {segment} {index}"));
    }

    fn emit_push_segment(&mut self, kind: Kind, index: u16) {
        self.emit_push(kind.segment(), index);
    }

    fn emit_pop_segment(&mut self, kind: Kind, index: u16) {
        self.emit_pop(kind.segment(), index);
    }

    fn emit_call(&mut self, name: &str, n_args: u16) {
        self.output.push(format!("call {name} {n_args}"));
    }

    fn emit_function(&mut self, name: &str, n_locals: u16) {
        self.output.push(format!("function {name} {n_locals}"));
    }

    fn emit_label(&mut self, name: &str) {
        self.output.push(format!("label {name}"));
    }

    fn emit_goto(&mut self, name: &str) {
        self.output.push(format!("goto {name}"));
    }

    fn emit_if_goto(&mut self, name: &str) {
        self.output.push(format!("if-goto {name}"));
    }

    fn next_label(&mut self, tag: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{}.{}${tag}{n}", self.class_name, self.subroutine_name)
    }

    // --- grammar ---

    pub fn compile_class(&mut self) -> Result<(), JackError> {
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier()?;
        self.expect_symbol('{')?;
        self.compile_class_var_decs()?;
        self.compile_subroutines()?;
        self.expect_symbol('}')?;
        Ok(())
    }

    fn compile_class_var_decs(&mut self) -> Result<(), JackError> {
        while self.peek_is_keyword(Keyword::Static) || self.peek_is_keyword(Keyword::Field) {
            let kind = if self.peek_is_keyword(Keyword::Static) { Kind::Static } else { Kind::Field };
            self.bump();
            let type_name = self.expect_type()?;
            loop {
                let name = self.expect_identifier()?;
                self.scopes.class.define(&name, &type_name, kind);
                if self.peek_is_symbol(',') {
                    self.bump();
                    continue;
                }
                break;
            }
            self.expect_symbol(';')?;
        }
        Ok(())
    }

    fn compile_subroutines(&mut self) -> Result<(), JackError> {
        while self.peek_is_keyword(Keyword::Constructor)
            || self.peek_is_keyword(Keyword::Function)
            || self.peek_is_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }
        Ok(())
    }

    fn compile_subroutine(&mut self) -> Result<(), JackError> {
        let sub_kind = match self.current()? {
            Token::Keyword(k @ (Keyword::Constructor | Keyword::Function | Keyword::Method)) => k,
            other => {
                return Err(JackError::UnexpectedToken {
                    line: self.current_line(),
                    expected: "constructor, function, or method".to_string(),
                    found: format!("{other:?}"),
                })
            }
        };
        self.bump();

        self.scopes.reset_subroutine();
        self.label_counter = 0;
        if sub_kind == Keyword::Method {
            let class_name = self.class_name.clone();
            self.scopes.subroutine.define("this", &class_name, Kind::Arg);
        }

        self.expect_return_type()?;
        let sub_name = self.expect_identifier()?;
        self.subroutine_name = sub_name.clone();

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.expect_symbol('{')?;
        self.compile_var_decs()?;

        let n_locals = self.scopes.subroutine.count(Kind::Var);
        self.emit_function(&format!("{}.{}", self.class_name, sub_name), n_locals);

        match sub_kind {
            Keyword::Method => {
                self.emit_push("argument", 0);
                self.emit_pop("pointer", 0);
            }
            Keyword::Constructor => {
                let n_fields = self.scopes.class.count(Kind::Field);
                self.emit_push("constant", n_fields);
                self.emit_call("Memory.alloc", 1);
                self.emit_pop("pointer", 0);
            }
            _ => {}
        }

        self.compile_statements()?;
        self.expect_symbol('}')?;
        Ok(())
    }

    fn compile_parameter_list(&mut self) -> Result<(), JackError> {
        if self.peek_is_symbol(')') {
            return Ok(());
        }
        loop {
            let type_name = self.expect_type()?;
            let name = self.expect_identifier()?;
            self.scopes.subroutine.define(&name, &type_name, Kind::Arg);
            if self.peek_is_symbol(',') {
                self.bump();
                continue;
            }
            break;
        }
        Ok(())
    }

    fn compile_var_decs(&mut self) -> Result<(), JackError> {
        while self.peek_is_keyword(Keyword::Var) {
            self.bump();
            let type_name = self.expect_type()?;
            loop {
                let name = self.expect_identifier()?;
                self.scopes.subroutine.define(&name, &type_name, Kind::Var);
                if self.peek_is_symbol(',') {
                    self.bump();
                    continue;
                }
                break;
            }
            self.expect_symbol(';')?;
        }
        Ok(())
    }

    fn is_statement_start(&self) -> bool {
        matches!(
            self.tokens.get(self.pos),
            Some(Token::Keyword(
                Keyword::Let | Keyword::If | Keyword::While | Keyword::Do | Keyword::Return
            ))
        )
    }

    fn compile_statements(&mut self) -> Result<(), JackError> {
        while self.is_statement_start() {
            match self.current()? {
                Token::Keyword(Keyword::Let) => self.compile_let()?,
                Token::Keyword(Keyword::If) => self.compile_if()?,
                Token::Keyword(Keyword::While) => self.compile_while()?,
                Token::Keyword(Keyword::Do) => self.compile_do()?,
                Token::Keyword(Keyword::Return) => self.compile_return()?,
                _ => unreachable!("is_statement_start guards this match"),
            }
        }
        Ok(())
    }

    fn compile_let(&mut self) -> Result<(), JackError> {
        self.expect_keyword(Keyword::Let)?;
        let name = self.expect_identifier()?;

        if self.peek_is_symbol('[') {
            let entry = self.resolve_variable(&name)?;
            self.emit_push_segment(entry.kind, entry.index);
            self.bump();
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.emit("add");
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;
            self.emit_pop("temp", 0);
            self.emit_pop("pointer", 1);
            self.emit_push("temp", 0);
            self.emit_pop("that", 0);
        } else {
            let entry = self.resolve_variable(&name)?;
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;
            self.emit_pop_segment(entry.kind, entry.index);
        }
        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), JackError> {
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.emit("not");
        let l_else = self.next_label("IF_ELSE");
        self.emit_if_goto(&l_else);

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        if self.peek_is_keyword(Keyword::Else) {
            let l_end = self.next_label("IF_END");
            self.emit_goto(&l_end);
            self.emit_label(&l_else);
            self.bump();
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
            self.emit_label(&l_end);
        } else {
            self.emit_label(&l_else);
        }
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), JackError> {
        self.expect_keyword(Keyword::While)?;
        let l_top = self.next_label("WHILE_TOP");
        self.emit_label(&l_top);
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.emit("not");
        let l_end = self.next_label("WHILE_END");
        self.emit_if_goto(&l_end);

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.emit_goto(&l_top);
        self.emit_label(&l_end);
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), JackError> {
        self.expect_keyword(Keyword::Do)?;
        let name = self.expect_identifier()?;
        self.compile_subroutine_call(name)?;
        self.expect_symbol(';')?;
        self.emit_pop("temp", 0);
        Ok(())
    }

    /// Distinguishes `return;` from `return expr;` by checking whether a
    /// `;` immediately follows, not by inspecting the token's kind.
    fn compile_return(&mut self) -> Result<(), JackError> {
        self.expect_keyword(Keyword::Return)?;
        if self.peek_is_symbol(';') {
            self.emit_push("constant", 0);
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.emit("return");
        Ok(())
    }

    fn compile_expression(&mut self) -> Result<(), JackError> {
        self.compile_term()?;
        while let Some(op) = self.peek_op_symbol() {
            self.bump();
            self.compile_term()?;
            self.emit_op(op);
        }
        Ok(())
    }

    fn emit_op(&mut self, op: char) {
        match op {
            '+' => self.emit("add"),
            '-' => self.emit("sub"),
            '&' => self.emit("and"),
            '|' => self.emit("or"),
            '<' => self.emit("lt"),
            '>' => self.emit("gt"),
            '=' => self.emit("eq"),
            '*' => self.emit_call("Math.multiply", 2),
            '/' => self.emit_call("Math.divide", 2),
            _ => unreachable!("peek_op_symbol only yields operator characters"),
        }
    }

    fn compile_term(&mut self) -> Result<(), JackError> {
        match self.current()? {
            Token::IntConst(n) => {
                self.bump();
                self.emit_push("constant", n);
            }
            Token::StringConst(s) => {
                self.bump();
                self.emit_string_const(&s);
            }
            Token::Keyword(Keyword::True) => {
                self.bump();
                self.emit_push("constant", 0);
                self.emit("not");
            }
            Token::Keyword(Keyword::False) | Token::Keyword(Keyword::Null) => {
                self.bump();
                self.emit_push("constant", 0);
            }
            Token::Keyword(Keyword::This) => {
                self.bump();
                self.emit_push("pointer", 0);
            }
            Token::Symbol('(') => {
                self.bump();
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            Token::Symbol(c @ ('-' | '~')) => {
                self.bump();
                self.compile_term()?;
                self.emit(if c == '-' { "neg" } else { "not" });
            }
            Token::Identifier(name) => {
                self.bump();
                if self.peek_is_symbol('[') {
                    let entry = self.resolve_variable(&name)?;
                    self.emit_push_segment(entry.kind, entry.index);
                    self.bump();
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.emit("add");
                    self.emit_pop("pointer", 1);
                    self.emit_push("that", 0);
                } else if self.peek_is_symbol('(') || self.peek_is_symbol('.') {
                    self.compile_subroutine_call(name)?;
                } else {
                    let entry = self.resolve_variable(&name)?;
                    self.emit_push_segment(entry.kind, entry.index);
                }
            }
            other => {
                return Err(JackError::UnexpectedToken {
                    line: self.current_line(),
                    expected: "a term".to_string(),
                    found: format!("{other:?}"),
                })
            }
        }
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16, JackError> {
        if self.peek_is_symbol(')') {
            return Ok(0);
        }
        let mut n = 0u16;
        loop {
            self.compile_expression()?;
            n += 1;
            if self.peek_is_symbol(',') {
                self.bump();
                continue;
            }
            break;
        }
        Ok(n)
    }

    /// `subroutineCall ::= ident '(' exprList ')' | (className|varName) '.' ident '(' exprList ')'`
    ///
    /// `first` has already been consumed; the next token (`(` or `.`)
    /// decides which of the three call shapes this is.
    fn compile_subroutine_call(&mut self, first: String) -> Result<(), JackError> {
        if self.peek_is_symbol('(') {
            self.bump();
            self.emit_push("pointer", 0);
            let n = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            self.emit_call(&format!("{}.{first}", self.class_name), n + 1);
            return Ok(());
        }

        if self.peek_is_symbol('.') {
            self.bump();
            let method_name = self.expect_identifier()?;
            self.expect_symbol('(')?;
            if let Some(entry) = self.scopes.resolve(&first).cloned() {
                self.emit_push_segment(entry.kind, entry.index);
                let n = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.emit_call(&format!("{}.{method_name}", entry.type_name), n + 1);
            } else {
                let n = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.emit_call(&format!("{first}.{method_name}"), n);
            }
            return Ok(());
        }

        Err(JackError::UnexpectedToken {
            line: self.current_line(),
            expected: "'(' or '.'".to_string(),
            found: format!("{:?}", self.tokens.get(self.pos)),
        })
    }

    fn emit_string_const(&mut self, s: &str) {
        self.emit_push("constant", s.len() as u16);
        self.emit_call("String.new", 1);
        for c in s.chars() {
            self.emit_push("constant", c as u16);
            self.emit_call("String.appendChar", 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn compile(source: &str) -> Vec<String> {
        let tokens = tokenize(source).unwrap();
        let mut compiler = Compiler::new(&tokens);
        compiler.compile_class().unwrap();
        compiler.into_output()
    }

    #[test]
    fn empty_class_produces_no_output() {
        assert_eq!(compile("class Main {\n}\n"), Vec::<String>::new());
    }

    #[test]
    fn function_with_return_constant() {
        let vm = compile("class Main {\n    function void main() {\n        return;\n    }\n}\n");
        assert_eq!(
            vm,
            vec!["function Main.main 0", "push constant 0", "return"]
        );
    }

    #[test]
    fn var_decs_produce_correct_nlocals() {
        let vm = compile(
            "class Main {\n    function void main() {\n        var int a, b;\n        return;\n    }\n}\n",
        );
        assert_eq!(vm[0], "function Main.main 2");
    }

    #[test]
    fn method_emits_this_binding_prologue() {
        let vm = compile(
            "class Point {\n    field int x;\n    method int getX() {\n        return x;\n    }\n}\n",
        );
        assert_eq!(
            vm,
            vec![
                "function Point.getX 0",
                "push argument 0",
                "pop pointer 0",
                "push this 0",
                "return",
            ]
        );
    }

    #[test]
    fn constructor_allocates_memory_for_fields() {
        let vm = compile(
            "class Point {\n    field int x, y;\n    constructor Point new() {\n        return this;\n    }\n}\n",
        );
        assert_eq!(
            vm,
            vec![
                "function Point.new 0",
                "push constant 2",
                "call Memory.alloc 1",
                "pop pointer 0",
                "push pointer 0",
                "return",
            ]
        );
    }

    #[test]
    fn let_with_array_access_uses_temp_pointer_dance() {
        let vm = compile(
            "class Main {\n    function void main() {\n        var Array a;\n        let a[1] = 2;\n        return;\n    }\n}\n",
        );
        assert!(vm.contains(&"pop temp 0".to_string()));
        assert!(vm.contains(&"pop pointer 1".to_string()));
        assert!(vm.contains(&"push temp 0".to_string()));
        assert!(vm.contains(&"pop that 0".to_string()));
    }

    #[test]
    fn bare_call_pushes_pointer_zero_and_qualifies_with_class_name() {
        let vm = compile(
            "class Main {\n    function void run() {\n        do helper();\n        return;\n    }\n}\n",
        );
        assert!(vm.contains(&"push pointer 0".to_string()));
        assert!(vm.contains(&"call Main.helper 1".to_string()));
    }

    #[test]
    fn static_call_on_unresolved_name_has_no_receiver_push() {
        let vm = compile(
            "class Main {\n    function void run() {\n        do Output.println();\n        return;\n    }\n}\n",
        );
        assert!(vm.contains(&"call Output.println 0".to_string()));
        assert!(!vm.contains(&"push pointer 0".to_string()));
    }

    #[test]
    fn method_call_through_declared_variable_pushes_receiver_and_qualifies_by_type() {
        let vm = compile(
            "class Main {\n    function void run() {\n        var Point p;\n        do p.getX();\n        return;\n    }\n}\n",
        );
        assert!(vm.contains(&"push local 0".to_string()));
        assert!(vm.contains(&"call Point.getX 1".to_string()));
    }

    #[test]
    fn if_without_else_uses_single_label() {
        let vm = compile(
            "class Main {\n    function void run() {\n        var int a;\n        if (true) {\n            let a = 1;\n        }\n        return;\n    }\n}\n",
        );
        // One if-goto and one matching label; no goto (no else branch).
        assert_eq!(vm.iter().filter(|l| l.starts_with("if-goto")).count(), 1);
        assert_eq!(vm.iter().filter(|l| l.starts_with("label")).count(), 1);
        assert_eq!(vm.iter().filter(|l| l.starts_with("goto")).count(), 0);
    }

    #[test]
    fn while_loop_jumps_back_to_top() {
        let vm = compile(
            "class Main {\n    function void run() {\n        var int a;\n        while (true) {\n            let a = 1;\n        }\n        return;\n    }\n}\n",
        );
        assert_eq!(vm.iter().filter(|l| l.starts_with("label")).count(), 2);
        assert_eq!(vm.iter().filter(|l| l.starts_with("goto")).count(), 1);
    }

    #[test]
    fn keyword_constants_compile_as_documented() {
        let vm = compile(
            "class Main {\n    function boolean run() {\n        return true;\n    }\n}\n",
        );
        assert_eq!(vm, vec!["function Main.run 0", "push constant 0", "not", "return"]);
    }

    #[test]
    fn string_constant_appends_each_character() {
        let vm = compile(
            "class Main {\n    function void run() {\n        do Output.printString(\"hi\");\n        return;\n    }\n}\n",
        );
        assert!(vm.contains(&"push constant 2".to_string()));
        assert!(vm.contains(&"call String.new 1".to_string()));
        assert!(vm.contains(&format!("push constant {}", 'h' as u16)));
        assert!(vm.contains(&format!("push constant {}", 'i' as u16)));
        assert_eq!(vm.iter().filter(|l| *l == "call String.appendChar 2").count(), 2);
    }

    #[test]
    fn unresolved_bare_identifier_used_as_variable_is_an_error() {
        let tokens = tokenize(
            "class Main {\n    function void run() {\n        let x = 1;\n        return;\n    }\n}\n",
        )
        .unwrap();
        let mut compiler = Compiler::new(&tokens);
        assert!(matches!(
            compiler.compile_class(),
            Err(JackError::UnresolvedIdentifier { .. })
        ));
    }
}
