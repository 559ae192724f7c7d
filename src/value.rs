// Tagged value model: `Value` is what flows through evaluation,
// `Type` is what a declared-type annotation names, `TypeTag` is the
// bitflag-friendly shape of `Value`'s discriminant used for error
// reporting, following the same split `vm.rs` draws between `Value`
// and `TypeTag`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use enumflags2::BitFlags;

use crate::error::{expect_one, expected, EvalError};

#[derive(BitFlags, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    Int = 0b000001,
    Bool = 0b000010,
    Str = 0b000100,
    Nil = 0b001000,
    Void = 0b010000,
    Record = 0b100000,
}

pub type TypeSet = BitFlags<TypeTag>;

// A declared type, as it appears on a parameter, field, variable
// definition or return type. Unlike `TypeTag` this carries the struct
// name for record types, since "which struct" matters for field
// validation and `new`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Str,
    Void,
    Struct(String),
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Bool | Type::Str)
    }

    // The zero value new bindings of this type start out holding,
    // per the §3 defaults table.
    pub fn default_value(&self) -> Value {
        match self {
            Type::Int => Value::Int(0),
            Type::Bool => Value::Bool(false),
            Type::Str => Value::Str(String::new()),
            Type::Void => Value::Void,
            Type::Struct(_) => Value::Nil,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Struct(name) => write!(f, "{}", name),
        }
    }
}

// A live struct instance. Field order is fixed at registration time
// (`RecordType`); the instance only needs name -> value.
#[derive(Debug, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: HashMap<String, Value>,
}

// Two `Value::Record`s referring to the same `Rc` are the same
// instance -- this is how field assignment through one alias is
// observed through another (§8 "record reference semantics").
pub type RecordRef = Rc<RefCell<Record>>;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Nil,
    Void,
    Record(RecordRef),
}

// Factors out the boilerplate of a type-checked binary operator: a
// whitelist of operand-pattern -> result arms, anything else a
// TypeMismatch. Mirrors vm.rs's `operator!` macro.
macro_rules! operator {
    (bin $name:ident $ctx:expr, $expect:expr => { $( $p:pat => $e:expr ),+ $(,)? }) => {
        pub fn $name(&self, other: &Value) -> Result<Value, EvalError> {
            use Value::*;
            #[allow(unreachable_patterns)]
            match (self, other) {
                $($p => Ok($e)),+,
                (a, b) => Err(expected(
                    $expect,
                    if $expect.contains(a.get_type()) { b.get_type() } else { a.get_type() },
                    $ctx,
                )),
            }
        }
    };
}

impl Value {
    pub fn get_type(&self) -> TypeTag {
        match self {
            Value::Int(_) => TypeTag::Int,
            Value::Bool(_) => TypeTag::Bool,
            Value::Str(_) => TypeTag::Str,
            Value::Nil => TypeTag::Nil,
            Value::Void => TypeTag::Void,
            Value::Record(_) => TypeTag::Record,
        }
    }

    // The single implicit conversion the language knows: int -> bool,
    // applied only by callers in a bool-demanding context (§4.4).
    pub fn coerce_to_bool(&self, context: &str) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            v => Err(expect_one(TypeTag::Bool, v.get_type(), context)),
        }
    }

    pub fn expect_int(&self, context: &str) -> Result<i64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i),
            v => Err(expect_one(TypeTag::Int, v.get_type(), context)),
        }
    }

    pub fn expect_str(&self, context: &str) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            v => Err(expect_one(TypeTag::Str, v.get_type(), context)),
        }
    }

    pub fn neg(&self) -> Result<Value, EvalError> {
        match self {
            Value::Int(i) => Ok(Value::Int(-i)),
            v => Err(expect_one(TypeTag::Int, v.get_type(), "unary -")),
        }
    }

    pub fn not(&self) -> Result<Value, EvalError> {
        Ok(Value::Bool(!self.coerce_to_bool("unary !")?))
    }

    operator! { bin add "+", TypeTag::Int | TypeTag::Str => {
        (Int(a), Int(b)) => Int(a + b),
        (Str(a), Str(b)) => Str(format!("{}{}", a, b)),
    } }

    operator! { bin sub "-", BitFlags::from_flag(TypeTag::Int) => { (Int(a), Int(b)) => Int(a - b) } }

    operator! { bin mul "*", BitFlags::from_flag(TypeTag::Int) => { (Int(a), Int(b)) => Int(a * b) } }

    operator! { bin lt "<", BitFlags::from_flag(TypeTag::Int) => { (Int(a), Int(b)) => Bool(a < b) } }

    operator! { bin gt ">", BitFlags::from_flag(TypeTag::Int) => { (Int(a), Int(b)) => Bool(a > b) } }

    operator! { bin lte "<=", BitFlags::from_flag(TypeTag::Int) => { (Int(a), Int(b)) => Bool(a <= b) } }

    operator! { bin gte ">=", BitFlags::from_flag(TypeTag::Int) => { (Int(a), Int(b)) => Bool(a >= b) } }

    // Integer division, truncated toward zero (Rust's native `/` for
    // signed integers already truncates toward zero). Division by
    // zero is a *language* exception, not a host error, so it returns
    // the raised string rather than an EvalError -- callers convert
    // it into `Flow::Raise` themselves.
    pub fn div(&self, other: &Value) -> Result<Value, DivError> {
        match (self, other) {
            (Value::Int(_), Value::Int(0)) => Err(DivError::DivideByZero),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
            (a, b) => Err(DivError::Type(expected(
                BitFlags::from_flag(TypeTag::Int),
                if matches!(a, Value::Int(_)) { b.get_type() } else { a.get_type() },
                "/",
            ))),
        }
    }

    // Defined for any two operand types (§4.4). Differing types are
    // unequal, except int/bool which compare after coercion; records
    // compare by identity and a record compares equal to Nil only
    // when it *is* Nil.
    pub fn eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Bool(b)) | (Bool(b), Int(a)) => (*a != 0) == *b,
            (Str(a), Str(b)) => a == b,
            (Nil, Nil) => true,
            (Record(a), Record(b)) => Rc::ptr_eq(a, b),
            (Record(_), Nil) | (Nil, Record(_)) => false,
            _ => false,
        }
    }

    // The textual form `print` emits. Records and Void are never
    // printable (§4.7); Nil prints as `nil` regardless of the static
    // record type it was declared with.
    pub fn printable(&self) -> Result<String, EvalError> {
        match self {
            Value::Int(i) => Ok(i.to_string()),
            Value::Str(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(if *b { "true".into() } else { "false".into() }),
            Value::Nil => Ok("nil".into()),
            Value::Void => Err(expected(
                TypeTag::Int | TypeTag::Bool | TypeTag::Str,
                TypeTag::Void,
                "print",
            )),
            Value::Record(_) => Err(expected(
                TypeTag::Int | TypeTag::Bool | TypeTag::Str,
                TypeTag::Record,
                "print",
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub enum DivError {
    DivideByZero,
    Type(EvalError),
}
