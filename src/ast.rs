// The typed tree the evaluator walks, and the adapter that builds it
// out of the untyped node shape an external parser hands us. Mirrors
// the teacher's `ast.rs` Expr/Statement ADTs, generalized with struct
// declarations, functions and the full statement set the statement
// executor needs (§4.6), plus a `lower()` boundary modeled on
// `bytecode.rs`'s `Insn -> Program` conversion.

use std::rc::Rc;

use crate::value::Type;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    IntLit(i64),
    StringLit(String),
    BoolLit(bool),
    NilLit,
    Var(String),
    FieldAccess(Box<Expr>, String),
    New(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    BinOp(BinOpKind, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

// The target of an assignment: a bare name or a dotted field path.
// `segments` is always non-empty; a single segment is a plain
// variable, more than one is `segments[0].segments[1]. ...`.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignPath {
    pub segments: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    VarDef(String, Type),
    Assign(AssignPath, Expr),
    Call(String, Vec<Expr>),
    If(Expr, Vec<Stmt>, Option<Vec<Stmt>>),
    For(Box<Stmt>, Expr, Box<Stmt>, Vec<Stmt>),
    Return(Option<Expr>),
    Raise(Expr),
    Try(Vec<Stmt>, Vec<Catch>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Catch {
    pub exception_type: String,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<(String, Type)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub functions: Vec<FuncDef>,
    pub structs: Vec<StructDef>,
}

pub type SharedExpr = Rc<Expr>;

// ---------------------------------------------------------------
// External adapter: the untyped node shape a parser hands us.
// ---------------------------------------------------------------
pub mod external {
    use std::collections::HashMap;

    use serde::Deserialize;
    use serde_json::Value as Json;

    // `element_type` plus a mapping of named children -- exactly the
    // interface spec'd in §6, nothing more. A child is whatever JSON
    // shape the grammar produced for it: another node (object), a
    // list of nodes (array of objects), or a scalar.
    #[derive(Clone, Debug, Deserialize)]
    pub struct Node {
        pub element_type: String,
        #[serde(default)]
        pub children: HashMap<String, Json>,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum LowerError {
        UnknownElementType(String),
        MissingChild { node: String, child: String },
        WrongChildType { node: String, child: String },
    }

    impl std::fmt::Display for LowerError {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            match self {
                LowerError::UnknownElementType(t) => write!(f, "unknown element_type {}", t),
                LowerError::MissingChild { node, child } => {
                    write!(f, "{} node missing child {}", node, child)
                }
                LowerError::WrongChildType { node, child } => {
                    write!(f, "{} node child {} has the wrong shape", node, child)
                }
            }
        }
    }

    impl Node {
        pub fn new(element_type: impl Into<String>) -> Node {
            Node {
                element_type: element_type.into(),
                children: HashMap::new(),
            }
        }

        pub fn with(mut self, key: &str, value: Json) -> Node {
            self.children.insert(key.to_string(), value);
            self
        }

        fn child(&self, key: &str) -> Result<&Json, LowerError> {
            self.children.get(key).ok_or_else(|| LowerError::MissingChild {
                node: self.element_type.clone(),
                child: key.to_string(),
            })
        }

        pub fn child_node(&self, key: &str) -> Result<Node, LowerError> {
            serde_json::from_value(self.child(key)?.clone()).map_err(|_| {
                LowerError::WrongChildType {
                    node: self.element_type.clone(),
                    child: key.to_string(),
                }
            })
        }

        pub fn child_node_opt(&self, key: &str) -> Result<Option<Node>, LowerError> {
            match self.children.get(key) {
                None | Some(Json::Null) => Ok(None),
                Some(v) => serde_json::from_value(v.clone())
                    .map(Some)
                    .map_err(|_| LowerError::WrongChildType {
                        node: self.element_type.clone(),
                        child: key.to_string(),
                    }),
            }
        }

        pub fn child_node_list(&self, key: &str) -> Result<Vec<Node>, LowerError> {
            match self.children.get(key) {
                None => Ok(Vec::new()),
                Some(v) => serde_json::from_value(v.clone()).map_err(|_| {
                    LowerError::WrongChildType {
                        node: self.element_type.clone(),
                        child: key.to_string(),
                    }
                }),
            }
        }

        pub fn child_str(&self, key: &str) -> Result<String, LowerError> {
            self.child(key)?
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| LowerError::WrongChildType {
                    node: self.element_type.clone(),
                    child: key.to_string(),
                })
        }

        pub fn child_str_opt(&self, key: &str) -> Result<Option<String>, LowerError> {
            match self.children.get(key) {
                None | Some(Json::Null) => Ok(None),
                Some(v) => v
                    .as_str()
                    .map(|s| Some(s.to_string()))
                    .ok_or_else(|| LowerError::WrongChildType {
                        node: self.element_type.clone(),
                        child: key.to_string(),
                    }),
            }
        }
    }
}

use external::{LowerError, Node};

fn lower_type(name: &str) -> Type {
    match name {
        "int" => Type::Int,
        "bool" => Type::Bool,
        "string" => Type::Str,
        "void" => Type::Void,
        other => Type::Struct(other.to_string()),
    }
}

pub fn lower(node: &Node) -> Result<Program, LowerError> {
    if node.element_type != "program" {
        return Err(LowerError::UnknownElementType(node.element_type.clone()));
    }
    let functions = node
        .child_node_list("functions")?
        .iter()
        .map(lower_function)
        .collect::<Result<Vec<_>, _>>()?;
    let structs = node
        .child_node_list("structs")?
        .iter()
        .map(lower_struct)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program { functions, structs })
}

fn lower_function(node: &Node) -> Result<FuncDef, LowerError> {
    let name = node.child_str("name")?;
    let params = node
        .child_node_list("args")?
        .iter()
        .map(|p| -> Result<(String, Type), LowerError> {
            Ok((p.child_str("name")?, lower_type(&p.child_str("var_type")?)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = node
        .child_str_opt("return_type")?
        .map(|s| lower_type(&s));
    let body = node
        .child_node_list("statements")?
        .iter()
        .map(lower_stmt)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FuncDef {
        name,
        params,
        return_type,
        body,
    })
}

fn lower_struct(node: &Node) -> Result<StructDef, LowerError> {
    let name = node.child_str("name")?;
    let fields = node
        .child_node_list("fields")?
        .iter()
        .map(|f| -> Result<(String, Type), LowerError> {
            Ok((f.child_str("name")?, lower_type(&f.child_str("var_type")?)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StructDef { name, fields })
}

fn lower_stmt(node: &Node) -> Result<Stmt, LowerError> {
    match node.element_type.as_str() {
        "vardef" => Ok(Stmt::VarDef(
            node.child_str("name")?,
            lower_type(&node.child_str("var_type")?),
        )),
        "=" => {
            let path = node.child_str("name")?;
            let segments = path.split('.').map(str::to_string).collect();
            let expr = lower_expr(&node.child_node("expression")?)?;
            Ok(Stmt::Assign(AssignPath { segments }, expr))
        }
        "fcall" => {
            let name = node.child_str("name")?;
            let args = node
                .child_node_list("args")?
                .iter()
                .map(lower_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Stmt::Call(name, args))
        }
        "if" => {
            let cond = lower_expr(&node.child_node("condition")?)?;
            let then = node
                .child_node_list("statements")?
                .iter()
                .map(lower_stmt)
                .collect::<Result<Vec<_>, _>>()?;
            let els = match node.child_node_opt("else_statements")? {
                Some(n) => Some(
                    n_to_stmt_list(&n)?,
                ),
                None => None,
            };
            Ok(Stmt::If(cond, then, els))
        }
        "for" => {
            let init = Box::new(lower_stmt(&node.child_node("init")?)?);
            let cond = lower_expr(&node.child_node("condition")?)?;
            let update = Box::new(lower_stmt(&node.child_node("update")?)?);
            let body = node
                .child_node_list("statements")?
                .iter()
                .map(lower_stmt)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Stmt::For(init, cond, update, body))
        }
        "return" => {
            let expr = match node.child_node_opt("expression")? {
                Some(n) => Some(lower_expr(&n)?),
                None => None,
            };
            Ok(Stmt::Return(expr))
        }
        "raise" => Ok(Stmt::Raise(lower_expr(&node.child_node("exception_type")?)?)),
        "try" => {
            let body = node
                .child_node_list("statements")?
                .iter()
                .map(lower_stmt)
                .collect::<Result<Vec<_>, _>>()?;
            let catchers = node
                .child_node_list("catchers")?
                .iter()
                .map(|c| -> Result<Catch, LowerError> {
                    Ok(Catch {
                        exception_type: c.child_str("exception_type")?,
                        body: c
                            .child_node_list("statements")?
                            .iter()
                            .map(lower_stmt)
                            .collect::<Result<Vec<_>, _>>()?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Stmt::Try(body, catchers))
        }
        other => Err(LowerError::UnknownElementType(other.to_string())),
    }
}

// `else_statements` is itself a list-shaped child in the parser's
// convention (a synthetic node wrapping a `statements` list isn't
// provided), so it lowers the same way a body list does when present.
fn n_to_stmt_list(node: &Node) -> Result<Vec<Stmt>, LowerError> {
    node.child_node_list("statements").or_else(|_| Ok(vec![lower_stmt(node)?]))
}

fn lower_expr(node: &Node) -> Result<Expr, LowerError> {
    match node.element_type.as_str() {
        "int" => {
            let raw = node.child_str("value")?;
            let n = raw.parse().map_err(|_| LowerError::WrongChildType {
                node: node.element_type.clone(),
                child: "value".to_string(),
            })?;
            Ok(Expr::IntLit(n))
        }
        "string" => Ok(Expr::StringLit(node.child_str("value")?)),
        "bool" => Ok(Expr::BoolLit(node.child_str("value")? == "true")),
        "nil" => Ok(Expr::NilLit),
        "var" => {
            // A dotted name (`a.b.c`) denotes chained field access;
            // a bare name is just a variable reference.
            let name = node.child_str("name")?;
            let mut parts = name.split('.');
            let mut expr = Expr::Var(parts.next().unwrap().to_string());
            for field in parts {
                expr = Expr::FieldAccess(Box::new(expr), field.to_string());
            }
            Ok(expr)
        }
        "new" => Ok(Expr::New(node.child_str("var_type")?)),
        "neg" => Ok(Expr::Neg(Box::new(lower_expr(&node.child_node("op1")?)?))),
        "!" => Ok(Expr::Not(Box::new(lower_expr(&node.child_node("op1")?)?))),
        "fcall" => {
            let name = node.child_str("name")?;
            let args = node
                .child_node_list("args")?
                .iter()
                .map(lower_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Call(name, args))
        }
        op @ ("+" | "-" | "*" | "/" | "<" | ">" | "<=" | ">=" | "==" | "!=" | "&&" | "||") => {
            let kind = match op {
                "+" => BinOpKind::Add,
                "-" => BinOpKind::Sub,
                "*" => BinOpKind::Mul,
                "/" => BinOpKind::Div,
                "<" => BinOpKind::Lt,
                ">" => BinOpKind::Gt,
                "<=" => BinOpKind::Lte,
                ">=" => BinOpKind::Gte,
                "==" => BinOpKind::Eq,
                "!=" => BinOpKind::Ne,
                "&&" => BinOpKind::And,
                _ => BinOpKind::Or,
            };
            let op1 = lower_expr(&node.child_node("op1")?)?;
            let op2 = lower_expr(&node.child_node("op2")?)?;
            Ok(Expr::BinOp(kind, Box::new(op1), Box::new(op2)))
        }
        other => Err(LowerError::UnknownElementType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lowers_a_minimal_program() {
        let raw = json!({
            "element_type": "program",
            "children": {
                "functions": [{
                    "element_type": "function",
                    "children": {
                        "name": "main",
                        "args": [],
                        "return_type": null,
                        "statements": [{
                            "element_type": "fcall",
                            "children": {
                                "name": "print",
                                "args": [{"element_type": "int", "children": {"value": "1"}}]
                            }
                        }]
                    }
                }],
                "structs": []
            }
        });
        let node: Node = serde_json::from_value(raw).unwrap();
        let program = lower(&node).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "main");
        assert_eq!(program.functions[0].body.len(), 1);
    }

    #[test]
    fn missing_literal_value_is_a_lower_error() {
        let node = Node::new("int");
        assert!(matches!(
            lower_expr(&node),
            Err(LowerError::MissingChild { .. })
        ));
    }

    #[test]
    fn non_numeric_int_value_is_a_lower_error() {
        let node = Node::new("int").with("value", json!("not-a-number"));
        assert!(matches!(
            lower_expr(&node),
            Err(LowerError::WrongChildType { .. })
        ));
    }
}
