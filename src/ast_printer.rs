use crate::expr::{Expr, Qualifier};
use crate::stmt::{MethodDecl, Stmt};
use crate::token::Token;

/// Converts statements and expressions to a parenthesized prefix form for
/// the `parse` subcommand (no heap allocations except `String` joins for
/// output).
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Define(name, value) => {
                format!("(define {} {})", name.lexeme, Self::print(value))
            }

            Stmt::Class(decl) => {
                let mut s = format!("(class {}", decl.name.lexeme);

                if let Some(parent) = &decl.parent {
                    s.push_str(&format!(" (extends {})", parent.lexeme));
                }

                for (name, init) in &decl.fields {
                    match init {
                        Some(expr) => {
                            s.push_str(&format!(" (field {} {})", name.lexeme, Self::print(expr)))
                        }
                        None => s.push_str(&format!(" (field {})", name.lexeme)),
                    }
                }

                for (name, init) in &decl.statics {
                    s.push_str(&format!(" (static {} {})", name.lexeme, Self::print(init)));
                }

                for method in &decl.methods {
                    s.push_str(&Self::print_method("method", method));
                }

                for method in &decl.static_methods {
                    s.push_str(&Self::print_method("static-method", method));
                }

                s.push(')');
                s
            }

            Stmt::Expression(expr) => Self::print(expr),
        }
    }

    fn print_method(kind: &str, method: &MethodDecl) -> String {
        format!(
            " ({} {} ({}) {})",
            kind,
            method.name.lexeme,
            Self::params(&method.params),
            Self::print(&method.body)
        )
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals / names ────────────────────────────────────────
            Expr::Literal(token) => token.lexeme.clone(),

            Expr::Variable(name) => name.lexeme.clone(),

            Expr::Receiver(keyword) => keyword.lexeme.clone(),

            // ── prim application ────────────────────────────────────────
            Expr::Prim(op, args) => {
                let mut s = format!("({}", op.lexeme);

                for arg in args {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }

                s.push(')');
                s
            }

            Expr::If(cond, then_branch, else_branch) => format!(
                "(if {} {} {})",
                Self::print(cond),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Let(bindings, body) => {
                let mut s = String::from("(let");

                for (name, value) in bindings {
                    s.push_str(&format!(" ({} {})", name.lexeme, Self::print(value)));
                }

                s.push_str(&format!(" {})", Self::print(body)));
                s
            }

            Expr::Proc(params, body) => format!(
                "(proc ({}) {})",
                Self::params(params),
                Self::print(body)
            ),

            Expr::Seq(exprs) => {
                let mut s = String::from("(seq");

                for e in exprs {
                    s.push(' ');
                    s.push_str(&Self::print(e));
                }

                s.push(')');
                s
            }

            Expr::New(_, class_expr) => format!("(new {})", Self::print(class_expr)),

            // ── qualified forms ─────────────────────────────────────────
            Expr::Get { qualifier, name } => {
                format!("(get {} {})", Self::qualifier(qualifier), name.lexeme)
            }

            Expr::Set {
                qualifier,
                name,
                value,
            } => match qualifier {
                Some(q) => format!(
                    "(set {} {} {})",
                    Self::qualifier(q),
                    name.lexeme,
                    Self::print(value)
                ),
                None => format!("(set {} {})", name.lexeme, Self::print(value)),
            },

            Expr::Call {
                qualifier,
                name,
                args,
            } => {
                let mut s = String::from("(call ");

                if let Some(q) = qualifier {
                    s.push_str(&Self::qualifier(q));
                    s.push(' ');
                }

                s.push_str(&name.lexeme);

                for arg in args {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }

                s.push(')');
                s
            }
        }
    }

    fn qualifier(q: &Qualifier) -> String {
        match q {
            Qualifier::SelfRef => "<self>".to_string(),
            Qualifier::This => "<this>".to_string(),
            Qualifier::Super => "<super>".to_string(),
            Qualifier::MyClass => "<myclass>".to_string(),
            Qualifier::SuperClass => "<superclass>".to_string(),
            Qualifier::Lexical => "<!@>".to_string(),
            Qualifier::Object(expr) => format!("<{}>", Self::print(expr)),
        }
    }

    fn params(params: &[Token]) -> String {
        params
            .iter()
            .map(|p| p.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
