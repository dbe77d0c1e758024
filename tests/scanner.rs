#[cfg(test)]
mod scanner_tests {
    use obj_interpreter as obj;

    use obj::scanner::*;
    use obj::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,;})<>",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_qualified_read() {
        assert_token_sequence(
            "<self>x",
            &[
                (TokenType::LESS, "<"),
                (TokenType::SELF, "self"),
                (TokenType::GREATER, ">"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_lexical_qualifier() {
        assert_token_sequence(
            "<!@>val",
            &[
                (TokenType::LESS, "<"),
                (TokenType::BANG_AT, "!@"),
                (TokenType::GREATER, ">"),
                (TokenType::IDENTIFIER, "val"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords() {
        assert_token_sequence(
            "class Rect extends Shape field w static method area end",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Rect"),
                (TokenType::EXTENDS, "extends"),
                (TokenType::IDENTIFIER, "Shape"),
                (TokenType::FIELD, "field"),
                (TokenType::IDENTIFIER, "w"),
                (TokenType::STATIC, "static"),
                (TokenType::METHOD, "method"),
                (TokenType::IDENTIFIER, "area"),
                (TokenType::END, "end"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_prim_call() {
        assert_token_sequence(
            "+(x, 12)",
            &[
                (TokenType::PLUS, "+"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::COMMA, ","),
                (TokenType::NUMBER(0), "12"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_comments_skipped() {
        assert_token_sequence(
            "% a comment to end of line\n42 % trailing",
            &[(TokenType::NUMBER(0), "42"), (TokenType::EOF, "")],
        );
    }

    #[test]
    fn test_scanner_07_number_value() {
        let tokens: Vec<Token> = Scanner::new(b"123".as_slice())
            .collect::<Result<Vec<_>, _>>()
            .expect("scan should succeed");

        match &tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 123),
            other => panic!("Expected NUMBER, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_08_string_value() {
        let tokens: Vec<Token> = Scanner::new(b"\"hello\"".as_slice())
            .collect::<Result<Vec<_>, _>>()
            .expect("scan should succeed");

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello"),
            other => panic!("Expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_chars_error() {
        let source = ",.$(";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, EOF
        assert_eq!(results.len(), 5, "Expected 5 items in result");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 1, "Expected 1 error message");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }
    }

    #[test]
    fn test_lone_bang_is_error() {
        let results: Vec<_> = Scanner::new(b"!x".as_slice()).collect();

        assert!(
            results.iter().any(|r| r.is_err()),
            "A lone '!' should be a lex error"
        );
    }
}
