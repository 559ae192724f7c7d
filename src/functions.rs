// Function dispatch keyed by (name, arity). Generalizes the
// teacher's single-arity assumption (`bytecode.rs`'s `HashMap`-backed
// instruction/label tables) to allow `f(x)` and `f(x, y)` to coexist
// as independent overloads, per §4.2.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::FuncDef;
use crate::error::{name_error, EvalError};

pub struct FunctionTable {
    funcs: HashMap<(String, usize), Rc<FuncDef>>,
}

impl FunctionTable {
    pub fn new() -> FunctionTable {
        FunctionTable {
            funcs: HashMap::new(),
        }
    }

    pub fn register(&mut self, func: FuncDef) -> Result<(), EvalError> {
        let key = (func.name.clone(), func.params.len());
        if self.funcs.contains_key(&key) {
            return Err(name_error(format!(
                "duplicate definition of {}/{}",
                key.0, key.1
            )));
        }
        self.funcs.insert(key, Rc::new(func));
        Ok(())
    }

    pub fn resolve(&self, name: &str, arity: usize) -> Result<Rc<FuncDef>, EvalError> {
        self.funcs
            .get(&(name.to_string(), arity))
            .cloned()
            .ok_or_else(|| name_error(format!("no function {}/{}", name, arity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Type;

    fn func(name: &str, arity: usize) -> FuncDef {
        FuncDef {
            name: name.to_string(),
            params: (0..arity).map(|i| (format!("p{}", i), Type::Int)).collect(),
            return_type: None,
            body: Vec::new(),
        }
    }

    #[test]
    fn arity_overloads_coexist() {
        let mut table = FunctionTable::new();
        table.register(func("f", 0)).unwrap();
        table.register(func("f", 1)).unwrap();
        assert!(table.resolve("f", 0).is_ok());
        assert!(table.resolve("f", 1).is_ok());
        assert!(table.resolve("f", 2).is_err());
    }

    #[test]
    fn duplicate_arity_is_a_name_error() {
        let mut table = FunctionTable::new();
        table.register(func("f", 1)).unwrap();
        assert!(table.register(func("f", 1)).is_err());
    }
}
