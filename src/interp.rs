// The tree-walking evaluator and statement executor. Merges the
// teacher's `typechecker.rs` `eval_expr` dispatch shape (a single
// exhaustive match over an `Expr` ADT, carried through nested blocks
// via `Env::chain`) with `vm.rs`'s `VM` struct-with-dispatch-loop
// idiom, generalized from type-checking / stack execution to full
// value evaluation threaded through a real call stack.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{AssignPath, BinOpKind, Catch, Expr, Program, Stmt};
use crate::env::{Binding, CallStack, Environment};
use crate::error::{expect_one, fault, name_error, EvalError, ErrorKind, Flow, Flowing};
use crate::functions::FunctionTable;
use crate::host::Host;
use crate::structs::StructRegistry;
use crate::thunk::LazyThunk;
use crate::value::{DivError, Type, TypeTag, Value};

pub struct Interp<'h> {
    functions: Rc<FunctionTable>,
    structs: Rc<StructRegistry>,
    stack: CallStack,
    host: &'h mut dyn Host,
}

// Registers struct types and functions, invokes `main` with no
// arguments, and reports whatever escapes to the host (§2 "Flow").
pub fn run(program: Program, host: &mut dyn Host) {
    let structs = match StructRegistry::register_all(program.structs) {
        Ok(r) => r,
        Err(e) => return host.error(e.kind(), e.message()),
    };
    let mut functions = FunctionTable::new();
    for f in program.functions {
        if let Err(e) = functions.register(f) {
            return host.error(e.kind(), e.message());
        }
    }
    let mut interp = Interp {
        functions: Rc::new(functions),
        structs: Rc::new(structs),
        stack: CallStack::new(),
        host,
    };
    let outcome = interp.call("main", &[], &Environment::empty());
    match outcome {
        Ok(_) => {}
        Err(Flow::Error(e)) => interp.host.error(e.kind(), e.message()),
        Err(Flow::Raise(s)) => interp
            .host
            .error(ErrorKind::Fault, &format!("uncaught exception: {}", s)),
        Err(Flow::Return(_)) => unreachable!("a return cannot escape main"),
    }
}

impl<'h> Interp<'h> {
    fn current_env(&self) -> Environment {
        self.stack.snapshot()
    }

    fn read_var(&mut self, name: &str, env: &Environment) -> Flowing<Value> {
        let cell = env
            .get(name)
            .ok_or_else(|| Flow::Error(name_error(format!("{} is not defined", name))))?;
        let ty = cell.borrow().ty.clone();
        let binding = cell.borrow().binding.clone();
        let value = match binding {
            Binding::Value(v) => Ok(v),
            Binding::Thunk(t) => {
                let mut eval = |e: &Expr, env: &Environment| self.eval_expr(e, env);
                t.force(&mut eval)
            }
        }?;
        // §4.4: a declared-bool variable or parameter is a bool-demanding
        // context for its own value, applied here (at force/read time,
        // not at assignment time) since assignment is lazy.
        if ty == Type::Bool {
            Ok(Value::Bool(
                value
                    .coerce_to_bool(&format!("{} (declared bool)", name))
                    .map_err(Flow::Error)?,
            ))
        } else {
            Ok(value)
        }
    }

    fn follow_field(&self, value: &Value, field: &str) -> Flowing<Value> {
        match value {
            Value::Nil => Err(Flow::Error(fault(format!(
                "nil dereference accessing .{}",
                field
            )))),
            Value::Record(r) => r
                .borrow()
                .fields
                .get(field)
                .cloned()
                .ok_or_else(|| Flow::Error(name_error(format!("no field named {}", field)))),
            other => Err(Flow::Error(expect_one(
                TypeTag::Record,
                other.get_type(),
                "field access",
            ))),
        }
    }

    pub fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Flowing<Value> {
        match expr {
            Expr::IntLit(i) => Ok(Value::Int(*i)),
            Expr::StringLit(s) => Ok(Value::Str(s.clone())),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::NilLit => Ok(Value::Nil),
            Expr::Var(name) => self.read_var(name, env),
            Expr::FieldAccess(base, field) => {
                let v = self.eval_expr(base, env)?;
                self.follow_field(&v, field)
            }
            Expr::New(type_name) => self
                .structs
                .instantiate(type_name)
                .map(Value::Record)
                .map_err(Flow::Error),
            Expr::Neg(e) => self.eval_expr(e, env)?.neg().map_err(Flow::Error),
            Expr::Not(e) => self.eval_expr(e, env)?.not().map_err(Flow::Error),
            Expr::Call(name, args) => self.call(name, args, env),
            Expr::BinOp(kind, a, b) => self.eval_binop(*kind, a, b, env),
        }
    }

    fn eval_binop(
        &mut self,
        kind: BinOpKind,
        a: &Expr,
        b: &Expr,
        env: &Environment,
    ) -> Flowing<Value> {
        match kind {
            BinOpKind::And => {
                if !self.eval_expr(a, env)?.coerce_to_bool("&&").map_err(Flow::Error)? {
                    Ok(Value::Bool(false))
                } else {
                    let r = self.eval_expr(b, env)?.coerce_to_bool("&&").map_err(Flow::Error)?;
                    Ok(Value::Bool(r))
                }
            }
            BinOpKind::Or => {
                if self.eval_expr(a, env)?.coerce_to_bool("||").map_err(Flow::Error)? {
                    Ok(Value::Bool(true))
                } else {
                    let r = self.eval_expr(b, env)?.coerce_to_bool("||").map_err(Flow::Error)?;
                    Ok(Value::Bool(r))
                }
            }
            BinOpKind::Eq => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                Ok(Value::Bool(l.eq(&r)))
            }
            BinOpKind::Ne => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                Ok(Value::Bool(!l.eq(&r)))
            }
            BinOpKind::Div => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                match l.div(&r) {
                    Ok(v) => Ok(v),
                    Err(DivError::DivideByZero) => Err(Flow::Raise("div0".to_string())),
                    Err(DivError::Type(e)) => Err(Flow::Error(e)),
                }
            }
            BinOpKind::Add => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.add(&r).map_err(Flow::Error)
            }
            BinOpKind::Sub => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.sub(&r).map_err(Flow::Error)
            }
            BinOpKind::Mul => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.mul(&r).map_err(Flow::Error)
            }
            BinOpKind::Lt => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.lt(&r).map_err(Flow::Error)
            }
            BinOpKind::Gt => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.gt(&r).map_err(Flow::Error)
            }
            BinOpKind::Lte => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.lte(&r).map_err(Flow::Error)
            }
            BinOpKind::Gte => {
                let l = self.eval_expr(a, env)?;
                let r = self.eval_expr(b, env)?;
                l.gte(&r).map_err(Flow::Error)
            }
        }
    }

    // Built-ins are tried before the user function table and are
    // never arity-checked against it (§4.2).
    fn call(&mut self, name: &str, args: &[Expr], env: &Environment) -> Flowing<Value> {
        trace!("call {}/{}", name, args.len());
        match name {
            "print" => self.builtin_print(args, env),
            "inputi" => self.builtin_input(args, env, true),
            "inputs" => self.builtin_input(args, env, false),
            _ => self.call_user_function(name, args, env),
        }
    }

    fn builtin_print(&mut self, args: &[Expr], env: &Environment) -> Flowing<Value> {
        let mut out = String::new();
        for arg in args {
            let v = self.eval_expr(arg, env)?;
            out.push_str(&v.printable().map_err(Flow::Error)?);
        }
        self.host.output(&out);
        Ok(Value::Void)
    }

    fn builtin_input(&mut self, args: &[Expr], env: &Environment, as_int: bool) -> Flowing<Value> {
        if args.len() > 1 {
            return Err(Flow::Error(name_error(
                "inputi/inputs accepts at most one prompt argument",
            )));
        }
        if let Some(prompt) = args.first() {
            self.builtin_print(std::slice::from_ref(prompt), env)?;
        }
        let line = self.host.get_input();
        if as_int {
            line.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Flow::Error(EvalError::Type(format!("{:?} is not an integer", line))))
        } else {
            Ok(Value::Str(line))
        }
    }

    fn call_user_function(
        &mut self,
        name: &str,
        args: &[Expr],
        caller_env: &Environment,
    ) -> Flowing<Value> {
        let func = self
            .functions
            .resolve(name, args.len())
            .map_err(Flow::Error)?;

        let mut params = HashMap::new();
        for ((pname, ptype), expr) in func.params.iter().zip(args.iter()) {
            let thunk = LazyThunk::new(Rc::new(expr.clone()), caller_env.clone());
            params.insert(pname.clone(), (ptype.clone(), Binding::Thunk(thunk)));
        }
        self.stack.push_func(params);
        let body_result = self.exec_stmts(&func.body);
        self.stack.pop_func();

        let produced = match body_result {
            Ok(()) => func
                .return_type
                .as_ref()
                .map(Type::default_value)
                .unwrap_or(Value::Void),
            Err(Flow::Return(v)) => v,
            Err(other) => return Err(other),
        };
        self.check_return(produced, &func.return_type, &func.name)
    }

    fn check_return(
        &self,
        value: Value,
        declared: &Option<Type>,
        name: &str,
    ) -> Flowing<Value> {
        let context = format!("return value of {}", name);
        match declared {
            None | Some(Type::Void) => match value {
                Value::Void => Ok(Value::Void),
                _ => Err(Flow::Error(EvalError::Type(format!(
                    "{} is declared void but returned a value",
                    name
                )))),
            },
            Some(Type::Bool) => Ok(Value::Bool(
                value.coerce_to_bool(&context).map_err(Flow::Error)?,
            )),
            Some(Type::Int) => match value {
                Value::Int(_) => Ok(value),
                v => Err(Flow::Error(expect_one(TypeTag::Int, v.get_type(), &context))),
            },
            Some(Type::Str) => match value {
                Value::Str(_) => Ok(value),
                v => Err(Flow::Error(expect_one(TypeTag::Str, v.get_type(), &context))),
            },
            Some(Type::Struct(sname)) => match &value {
                Value::Nil => Ok(value),
                Value::Record(r) if &r.borrow().type_name == sname => Ok(value),
                v => Err(Flow::Error(EvalError::Type(format!(
                    "{}: expected {} or nil, got {:?}",
                    context, sname, v.get_type()
                )))),
            },
        }
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Flowing<()> {
        for s in stmts {
            self.exec_stmt(s)?;
        }
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Flowing<()> {
        self.stack.top_mut().push_block();
        let result = self.exec_stmts(stmts);
        self.stack.top_mut().pop_block();
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Flowing<()> {
        trace!("exec {:?}", stmt);
        match stmt {
            Stmt::VarDef(name, ty) => {
                let default = ty.default_value();
                if !self
                    .stack
                    .top_mut()
                    .create(name, ty.clone(), Binding::Value(default))
                {
                    return Err(Flow::Error(name_error(format!(
                        "{} already defined in this block",
                        name
                    ))));
                }
                Ok(())
            }
            Stmt::Assign(path, expr) => self.exec_assign(path, expr),
            Stmt::Call(name, args) => {
                let env = self.current_env();
                self.call(name, args, &env).map(|_| ())
            }
            Stmt::If(cond, then, els) => {
                let env = self.current_env();
                let c = self
                    .eval_expr(cond, &env)?
                    .coerce_to_bool("if condition")
                    .map_err(Flow::Error)?;
                if c {
                    self.exec_block(then)
                } else if let Some(e) = els {
                    self.exec_block(e)
                } else {
                    Ok(())
                }
            }
            Stmt::For(init, cond, update, body) => self.exec_for(init, cond, update, body),
            Stmt::Return(expr) => {
                let env = self.current_env();
                let value = match expr {
                    Some(e) => self.eval_expr(e, &env)?,
                    None => Value::Void,
                };
                Err(Flow::Return(value))
            }
            Stmt::Raise(expr) => {
                let env = self.current_env();
                let value = self.eval_expr(expr, &env)?;
                let s = value.expect_str("raise").map_err(Flow::Error)?.to_string();
                Err(Flow::Raise(s))
            }
            Stmt::Try(body, catches) => self.exec_try(body, catches),
        }
    }

    fn exec_for(&mut self, init: &Stmt, cond: &Expr, update: &Stmt, body: &[Stmt]) -> Flowing<()> {
        self.stack.top_mut().push_block();
        let result = (|| -> Flowing<()> {
            self.exec_stmt(init)?;
            loop {
                let env = self.current_env();
                let keep_going = self
                    .eval_expr(cond, &env)?
                    .coerce_to_bool("for condition")
                    .map_err(Flow::Error)?;
                if !keep_going {
                    return Ok(());
                }
                self.exec_block(body)?;
                self.exec_stmt(update)?;
            }
        })();
        self.stack.top_mut().pop_block();
        result
    }

    fn exec_try(&mut self, body: &[Stmt], catches: &[Catch]) -> Flowing<()> {
        match self.exec_block(body) {
            Err(Flow::Raise(s)) => {
                for catch in catches {
                    if catch.exception_type == s {
                        return self.exec_block(&catch.body);
                    }
                }
                Err(Flow::Raise(s))
            }
            other => other,
        }
    }

    fn exec_assign(&mut self, path: &AssignPath, expr: &Expr) -> Flowing<()> {
        let caller_env = self.current_env();
        if path.segments.len() == 1 {
            let name = &path.segments[0];
            let thunk = LazyThunk::new(Rc::new(expr.clone()), caller_env);
            if !self.stack.top_mut().set(name, Binding::Thunk(thunk)) {
                return Err(Flow::Error(name_error(format!("{} is not defined", name))));
            }
            return Ok(());
        }

        let (base, rest) = path.segments.split_first().expect("non-empty path");
        let (last, middle) = rest.split_last().expect("dotted path has >= 2 segments");
        let mut current = self.read_var(base, &caller_env)?;
        for field in middle {
            current = self.follow_field(&current, field)?;
        }
        let record = match current {
            Value::Record(r) => r,
            Value::Nil => {
                return Err(Flow::Error(fault(format!(
                    "nil dereference assigning {}",
                    path.segments.join(".")
                ))))
            }
            other => {
                return Err(Flow::Error(expect_one(
                    TypeTag::Record,
                    other.get_type(),
                    "field assignment",
                )))
            }
        };

        let value = self.eval_expr(expr, &caller_env)?;
        let type_name = record.borrow().type_name.clone();
        let field_type = self
            .structs
            .field_type(&type_name, last)
            .cloned()
            .ok_or_else(|| Flow::Error(name_error(format!("{} has no field {}", type_name, last))))?;
        let coerced = self.coerce_field(value, &field_type, last)?;
        record.borrow_mut().fields.insert(last.clone(), coerced);
        Ok(())
    }

    fn coerce_field(&self, value: Value, field_type: &Type, field_name: &str) -> Flowing<Value> {
        match field_type {
            Type::Bool => Ok(Value::Bool(
                value
                    .coerce_to_bool(&format!("field {}", field_name))
                    .map_err(Flow::Error)?,
            )),
            Type::Int => match value {
                Value::Int(_) => Ok(value),
                v => Err(Flow::Error(expect_one(TypeTag::Int, v.get_type(), field_name))),
            },
            Type::Str => match value {
                Value::Str(_) => Ok(value),
                v => Err(Flow::Error(expect_one(TypeTag::Str, v.get_type(), field_name))),
            },
            Type::Struct(sname) => match &value {
                Value::Nil => Ok(value),
                Value::Record(r) if &r.borrow().type_name == sname => Ok(value),
                _ => Err(Flow::Error(EvalError::Type(format!(
                    "field {} expects {} or nil",
                    field_name, sname
                )))),
            },
            Type::Void => Err(Flow::Error(EvalError::Type(format!(
                "field {} cannot be void",
                field_name
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignPath as AP, Catch, FuncDef, StructDef};
    use crate::host::RecordingHost;

    fn main_only(body: Vec<Stmt>) -> Program {
        Program {
            functions: vec![FuncDef {
                name: "main".into(),
                params: vec![],
                return_type: None,
                body,
            }],
            structs: vec![],
        }
    }

    fn run_with(program: Program) -> RecordingHost {
        let mut host = RecordingHost::default();
        run(program, &mut host);
        host
    }

    fn call(name: &str, args: Vec<Expr>) -> Stmt {
        Stmt::Call(name.into(), args)
    }

    #[test]
    fn factorial_of_five() {
        // func main(){ print(fact(5)); }
        // func fact(n){ if(n<=1){return 1;} return n*fact(n-1); }
        let main = FuncDef {
            name: "main".into(),
            params: vec![],
            return_type: None,
            body: vec![call(
                "print",
                vec![Expr::Call("fact".into(), vec![Expr::IntLit(5)])],
            )],
        };
        let fact = FuncDef {
            name: "fact".into(),
            params: vec![("n".into(), Type::Int)],
            return_type: Some(Type::Int),
            body: vec![
                Stmt::If(
                    Expr::BinOp(
                        BinOpKind::Lte,
                        Box::new(Expr::Var("n".into())),
                        Box::new(Expr::IntLit(1)),
                    ),
                    vec![Stmt::Return(Some(Expr::IntLit(1)))],
                    None,
                ),
                Stmt::Return(Some(Expr::BinOp(
                    BinOpKind::Mul,
                    Box::new(Expr::Var("n".into())),
                    Box::new(Expr::Call(
                        "fact".into(),
                        vec![Expr::BinOp(
                            BinOpKind::Sub,
                            Box::new(Expr::Var("n".into())),
                            Box::new(Expr::IntLit(1)),
                        )],
                    )),
                ))),
            ],
        };
        let program = Program {
            functions: vec![main, fact],
            structs: vec![],
        };
        let host = run_with(program);
        assert_eq!(host.lines, vec!["120"]);
        assert!(host.error.is_none());
    }

    #[test]
    fn unused_lazy_argument_never_forces() {
        // func main(){ var x; x = foo(); print("OK"); }
        // func foo(){ return 1/0; }
        let main = FuncDef {
            name: "main".into(),
            params: vec![],
            return_type: None,
            body: vec![
                Stmt::VarDef("x".into(), Type::Int),
                Stmt::Assign(
                    AP { segments: vec!["x".into()] },
                    Expr::Call("foo".into(), vec![]),
                ),
                call("print", vec![Expr::StringLit("OK".into())]),
            ],
        };
        let foo = FuncDef {
            name: "foo".into(),
            params: vec![],
            return_type: Some(Type::Int),
            body: vec![Stmt::Return(Some(Expr::BinOp(
                BinOpKind::Div,
                Box::new(Expr::IntLit(1)),
                Box::new(Expr::IntLit(0)),
            )))],
        };
        let host = run_with(Program {
            functions: vec![main, foo],
            structs: vec![],
        });
        assert_eq!(host.lines, vec!["OK"]);
        assert!(host.error.is_none());
    }

    #[test]
    fn deferred_name_error_surfaces_on_read() {
        // func main(){ var x; x = y+1; print("OK"); print(x); }
        let main = main_only(vec![
            Stmt::VarDef("x".into(), Type::Int),
            Stmt::Assign(
                AP { segments: vec!["x".into()] },
                Expr::BinOp(
                    BinOpKind::Add,
                    Box::new(Expr::Var("y".into())),
                    Box::new(Expr::IntLit(1)),
                ),
            ),
            call("print", vec![Expr::StringLit("OK".into())]),
            call("print", vec![Expr::Var("x".into())]),
        ]);
        let host = run_with(main);
        assert_eq!(host.lines, vec!["OK"]);
        assert_eq!(host.error.as_ref().map(|(k, _)| *k), Some(ErrorKind::Name));
    }

    #[test]
    fn struct_field_and_nil_comparison() {
        // struct N{v:int; next:N;}
        // func main(){ var h:N; h=new N; h.v=7; print(h.v); print(h.next==nil); }
        let n = StructDef {
            name: "N".into(),
            fields: vec![
                ("v".into(), Type::Int),
                ("next".into(), Type::Struct("N".into())),
            ],
        };
        let main = main_only(vec![
            Stmt::VarDef("h".into(), Type::Struct("N".into())),
            Stmt::Assign(AP { segments: vec!["h".into()] }, Expr::New("N".into())),
            Stmt::Assign(
                AP { segments: vec!["h".into(), "v".into()] },
                Expr::IntLit(7),
            ),
            call("print", vec![Expr::FieldAccess(Box::new(Expr::Var("h".into())), "v".into())]),
            call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::Eq,
                    Box::new(Expr::FieldAccess(Box::new(Expr::Var("h".into())), "next".into())),
                    Box::new(Expr::NilLit),
                )],
            ),
        ]);
        let host = run_with(Program {
            functions: main.functions,
            structs: vec![n],
        });
        assert_eq!(host.lines, vec!["7", "true"]);
    }

    #[test]
    fn div_by_zero_is_catchable() {
        // func main(){ try { print(1/0); } catch "div0" { print("caught"); } }
        let main = main_only(vec![Stmt::Try(
            vec![call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::Div,
                    Box::new(Expr::IntLit(1)),
                    Box::new(Expr::IntLit(0)),
                )],
            )],
            vec![Catch {
                exception_type: "div0".into(),
                body: vec![call("print", vec![Expr::StringLit("caught".into())])],
            }],
        )]);
        let host = run_with(main);
        assert_eq!(host.lines, vec!["caught"]);
    }

    #[test]
    fn functions_overload_by_arity() {
        // func f(){return 1;} func f(a){return a+1;}
        // func main(){print(f()); print(f(10));}
        let f0 = FuncDef {
            name: "f".into(),
            params: vec![],
            return_type: Some(Type::Int),
            body: vec![Stmt::Return(Some(Expr::IntLit(1)))],
        };
        let f1 = FuncDef {
            name: "f".into(),
            params: vec![("a".into(), Type::Int)],
            return_type: Some(Type::Int),
            body: vec![Stmt::Return(Some(Expr::BinOp(
                BinOpKind::Add,
                Box::new(Expr::Var("a".into())),
                Box::new(Expr::IntLit(1)),
            )))],
        };
        let main = FuncDef {
            name: "main".into(),
            params: vec![],
            return_type: None,
            body: vec![
                call("print", vec![Expr::Call("f".into(), vec![])]),
                call("print", vec![Expr::Call("f".into(), vec![Expr::IntLit(10)])]),
            ],
        };
        let host = run_with(Program {
            functions: vec![f0, f1, main],
            structs: vec![],
        });
        assert_eq!(host.lines, vec!["1", "11"]);
    }

    #[test]
    fn short_circuit_never_evaluates_the_right_operand() {
        // func main(){ print(false && crash()); print(true || crash()); }
        // func crash(){ return 1/0; }
        let crash = FuncDef {
            name: "crash".into(),
            params: vec![],
            return_type: Some(Type::Int),
            body: vec![Stmt::Return(Some(Expr::BinOp(
                BinOpKind::Div,
                Box::new(Expr::IntLit(1)),
                Box::new(Expr::IntLit(0)),
            )))],
        };
        let main = main_only(vec![
            call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::And,
                    Box::new(Expr::BoolLit(false)),
                    Box::new(Expr::Call("crash".into(), vec![])),
                )],
            ),
            call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::Or,
                    Box::new(Expr::BoolLit(true)),
                    Box::new(Expr::Call("crash".into(), vec![])),
                )],
            ),
        ]);
        let host = run_with(Program {
            functions: vec![main.functions.into_iter().next().unwrap(), crash],
            structs: vec![],
        });
        assert_eq!(host.lines, vec!["false", "true"]);
        assert!(host.error.is_none());
    }

    #[test]
    fn equality_across_types() {
        // 5 == "5" is false; 1 == true is true; nil == nil is true.
        let main = main_only(vec![
            call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::Eq,
                    Box::new(Expr::IntLit(5)),
                    Box::new(Expr::StringLit("5".into())),
                )],
            ),
            call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::Eq,
                    Box::new(Expr::IntLit(1)),
                    Box::new(Expr::BoolLit(true)),
                )],
            ),
            call(
                "print",
                vec![Expr::BinOp(
                    BinOpKind::Eq,
                    Box::new(Expr::NilLit),
                    Box::new(Expr::NilLit),
                )],
            ),
        ]);
        let host = run_with(main);
        assert_eq!(host.lines, vec!["false", "true", "true"]);
    }

    #[test]
    fn closure_capture_freezes_at_assignment_time() {
        // func main(){ var x:int; var y:int; x=1; y=x; x=99; print(y); }
        let main = main_only(vec![
            Stmt::VarDef("x".into(), Type::Int),
            Stmt::VarDef("y".into(), Type::Int),
            Stmt::Assign(AP { segments: vec!["x".into()] }, Expr::IntLit(1)),
            Stmt::Assign(AP { segments: vec!["y".into()] }, Expr::Var("x".into())),
            Stmt::Assign(AP { segments: vec!["x".into()] }, Expr::IntLit(99)),
            call("print", vec![Expr::Var("y".into())]),
        ]);
        let host = run_with(main);
        assert_eq!(host.lines, vec!["1"]);
        assert!(host.error.is_none());
    }

    #[test]
    fn record_reference_semantics_share_state() {
        // struct T{f:int;} func main(){ var a:T; a=new T; var b:T; b=a; b.f=5; print(a.f); }
        let t = StructDef {
            name: "T".into(),
            fields: vec![("f".into(), Type::Int)],
        };
        let main = main_only(vec![
            Stmt::VarDef("a".into(), Type::Struct("T".into())),
            Stmt::Assign(AP { segments: vec!["a".into()] }, Expr::New("T".into())),
            Stmt::VarDef("b".into(), Type::Struct("T".into())),
            Stmt::Assign(AP { segments: vec!["b".into()] }, Expr::Var("a".into())),
            Stmt::Assign(AP { segments: vec!["b".into(), "f".into()] }, Expr::IntLit(5)),
            call("print", vec![Expr::FieldAccess(Box::new(Expr::Var("a".into())), "f".into())]),
        ]);
        let host = run_with(Program {
            functions: main.functions,
            structs: vec![t],
        });
        assert_eq!(host.lines, vec!["5"]);
    }

    #[test]
    fn bool_typed_variable_coerces_assigned_int() {
        // func main(){ var b:bool; b = 5; print(b); }
        let main = main_only(vec![
            Stmt::VarDef("b".into(), Type::Bool),
            Stmt::Assign(AP { segments: vec!["b".into()] }, Expr::IntLit(5)),
            call("print", vec![Expr::Var("b".into())]),
        ]);
        let host = run_with(main);
        assert_eq!(host.lines, vec!["true"]);
        assert!(host.error.is_none());
    }

    #[test]
    fn bool_typed_parameter_coerces_passed_int() {
        // func f(b:bool){print(b);} func main(){f(5);}
        let f = FuncDef {
            name: "f".into(),
            params: vec![("b".into(), Type::Bool)],
            return_type: None,
            body: vec![call("print", vec![Expr::Var("b".into())])],
        };
        let main = FuncDef {
            name: "main".into(),
            params: vec![],
            return_type: None,
            body: vec![call("f", vec![Expr::IntLit(5)])],
        };
        let host = run_with(Program {
            functions: vec![f, main],
            structs: vec![],
        });
        assert_eq!(host.lines, vec!["true"]);
        assert!(host.error.is_none());
    }

    #[test]
    fn block_scoped_for_variable_is_invisible_after_loop() {
        // for(var i:int; i<3; i=i+1;){ } print(i);  -- `i` from init leaks
        // only as far as the for's own wrapping block, which ends with it.
        let main = main_only(vec![
            Stmt::For(
                Box::new(Stmt::VarDef("i".into(), Type::Int)),
                Expr::BinOp(
                    BinOpKind::Lt,
                    Box::new(Expr::Var("i".into())),
                    Box::new(Expr::IntLit(3)),
                ),
                Box::new(Stmt::Assign(
                    AP { segments: vec!["i".into()] },
                    Expr::BinOp(
                        BinOpKind::Add,
                        Box::new(Expr::Var("i".into())),
                        Box::new(Expr::IntLit(1)),
                    ),
                )),
                vec![],
            ),
            call("print", vec![Expr::Var("i".into())]),
        ]);
        let host = run_with(main);
        assert!(host.lines.is_empty());
        assert_eq!(host.error.as_ref().map(|(k, _)| *k), Some(ErrorKind::Name));
    }
}
