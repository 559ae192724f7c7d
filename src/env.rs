// Lexical scoping: a stack of activation records, each a stack of
// block scopes, each an ordered-by-insertion mapping from name to a
// shared binding cell. Generalizes the teacher's two competing
// `Env<T>` drafts -- `env.rs`'s parent-chained scope and
// `bytecode.rs`'s push/pop stack-of-maps -- into the two-level
// activation-record/block-scope shape this interpreter's semantics
// require (lookup never crosses an activation-record boundary).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::thunk::LazyThunk;
use crate::value::{Type, Value};

#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Thunk(LazyThunk),
}

// A cell carries its name's declared type alongside the binding
// itself. Nothing else remembers that a variable or parameter was
// declared `bool` once `VarDef`/parameter binding is done with the
// AST, and §4.4 requires a bool-typed binding's value to be coerced
// (int -> bool) at the point it's read -- not at the point it's
// assigned, since assignment is lazy and must stay lazy.
pub struct Slot {
    pub ty: Type,
    pub binding: Binding,
}

pub type Cell = Rc<RefCell<Slot>>;
type Scope = HashMap<String, Cell>;

// One activation record's stack of block scopes, innermost last.
// This doubles as the "effective environment" a thunk captures: a
// `snapshot()` is just a clone of one of these, sharing cells with
// the original.
#[derive(Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn empty() -> Environment {
        Environment { scopes: Vec::new() }
    }

    fn with_params(params: Scope) -> Environment {
        Environment {
            scopes: vec![params],
        }
    }

    pub fn get(&self, name: &str) -> Option<Cell> {
        self.scopes.iter().rev().find_map(|s| s.get(name).cloned())
    }

    // Define `name` in the innermost scope; fails (returns false) if
    // already present there -- shadowing across blocks is fine,
    // redefinition within one block is a NAME error at the call site.
    pub fn create(&mut self, name: &str, ty: Type, binding: Binding) -> bool {
        let scope = self.scopes.last_mut().expect("no open block scope");
        if scope.contains_key(name) {
            false
        } else {
            scope.insert(name.to_string(), Rc::new(RefCell::new(Slot { ty, binding })));
            true
        }
    }

    // Reassignment rebinds the name to a *new* cell in whichever scope
    // already holds it, rather than mutating the existing cell's
    // contents in place. This is what makes closure capture freeze
    // correctly: a thunk that captured an env snapshot before this
    // call keeps pointing at the old cell and is untouched by it
    // (§8 "closure capture" -- `x = expr; y = x; x = new_expr` must
    // not let reading `y` observe the later `x`). The name's declared
    // type can't change on reassignment, so it's carried over from the
    // cell being replaced.
    pub fn set(&mut self, name: &str, binding: Binding) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(existing) = scope.get(name) {
                let ty = existing.borrow().ty.clone();
                scope.insert(name.to_string(), Rc::new(RefCell::new(Slot { ty, binding })));
                return true;
            }
        }
        false
    }

    pub fn push_block(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_block(&mut self) {
        self.scopes.pop().expect("block underflow");
    }
}

// The live call stack: one `Environment` per currently executing
// function, outermost (the caller) first. Owned exclusively by the
// evaluator; never shared or captured -- only individual
// `Environment` snapshots are.
pub struct CallStack {
    frames: Vec<Environment>,
}

impl CallStack {
    pub fn new() -> CallStack {
        CallStack { frames: Vec::new() }
    }

    pub fn push_func(&mut self, params: HashMap<String, (Type, Binding)>) {
        let scope: Scope = params
            .into_iter()
            .map(|(k, (ty, binding))| (k, Rc::new(RefCell::new(Slot { ty, binding }))))
            .collect();
        self.frames.push(Environment::with_params(scope));
    }

    pub fn pop_func(&mut self) {
        self.frames.pop().expect("activation-record underflow");
    }

    pub fn top(&self) -> &Environment {
        self.frames.last().expect("no active function")
    }

    pub fn top_mut(&mut self) -> &mut Environment {
        self.frames.last_mut().expect("no active function")
    }

    // Immutable shallow copy of the top activation record's block
    // scopes, for closure capture by a thunk.
    pub fn snapshot(&self) -> Environment {
        self.top().clone()
    }
}
