// Call-by-need argument and assignment values: an unforced expression
// plus the environment it closed over. Grounded in
// `original_source/type_valuev4.py`'s `LazyValue` (evaluated/evaluating
// flags, memoized `value()`) re-expressed as an owned Rust type
// instead of a Python closure, and in the teacher's `Node<T> = Rc<T>`
// sharing idiom (`ast.rs`) for why the inner state lives behind an
// `Rc<RefCell<..>>` rather than being cloned per read.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Expr;
use crate::env::Environment;
use crate::error::{fault, Flow, Flowing};
use crate::value::Value;

enum State {
    Pending,
    InProgress,
    Done(Flowing<Value>),
}

struct Inner {
    expr: Rc<Expr>,
    env: Environment,
    state: RefCell<State>,
}

#[derive(Clone)]
pub struct LazyThunk(Rc<Inner>);

impl LazyThunk {
    pub fn new(expr: Rc<Expr>, env: Environment) -> LazyThunk {
        LazyThunk(Rc::new(Inner {
            expr,
            env,
            state: RefCell::new(State::Pending),
        }))
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(*self.0.state.borrow(), State::Done(_))
    }

    // `eval` is `interp::eval_expr` threaded in by the caller, which
    // avoids a circular module dependency between `thunk` and `interp`
    // (the thunk doesn't know how to evaluate an `Expr`, only when and
    // whether to).
    pub fn force(
        &self,
        eval: &mut dyn FnMut(&Expr, &Environment) -> Flowing<Value>,
    ) -> Flowing<Value> {
        {
            let mut state = self.0.state.borrow_mut();
            match &*state {
                State::Done(result) => return result.clone(),
                State::InProgress => {
                    return Err(Flow::Error(fault("cyclic evaluation of a lazy value")))
                }
                State::Pending => *state = State::InProgress,
            }
        }

        let result = eval(&self.0.expr, &self.0.env);
        *self.0.state.borrow_mut() = State::Done(result.clone());
        result
    }
}
