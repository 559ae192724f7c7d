// Struct/record type registry: two-pass registration (reserve names,
// then validate field types) modeled on
// `original_source/interpreterv3.py`'s `__set_up_user_defined_types`,
// which builds `valid_user_types_names` before walking
// `user_types_fields` so forward and mutually-recursive struct
// references resolve.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::StructDef;
use crate::error::EvalError;
use crate::value::{Record, RecordRef, Type, Value};

pub struct StructRegistry {
    defs: HashMap<String, Rc<StructDef>>,
}

impl StructRegistry {
    // Registers every struct declared in a program in one shot: first
    // reserving all names (so field types may reference a struct
    // declared later, or itself), then validating each field's
    // declared type against primitives and the reserved set.
    pub fn register_all(structs: Vec<StructDef>) -> Result<StructRegistry, EvalError> {
        let mut defs = HashMap::new();
        for s in &structs {
            if defs.contains_key(&s.name) {
                return Err(EvalError::Type(format!(
                    "duplicate struct type {}",
                    s.name
                )));
            }
            defs.insert(s.name.clone(), ());
        }
        let names: std::collections::HashSet<&String> = defs.keys().collect();

        let mut validated = HashMap::new();
        for s in structs {
            let mut seen_fields = std::collections::HashSet::new();
            for (field_name, field_type) in &s.fields {
                if !seen_fields.insert(field_name.clone()) {
                    return Err(EvalError::Type(format!(
                        "duplicate field {} in struct {}",
                        field_name, s.name
                    )));
                }
                if let Type::Struct(target) = field_type {
                    if !names.contains(target) {
                        return Err(EvalError::Type(format!(
                            "field {}.{} has unknown struct type {}",
                            s.name, field_name, target
                        )));
                    }
                }
            }
            validated.insert(s.name.clone(), Rc::new(s));
        }

        Ok(StructRegistry { defs: validated })
    }

    pub fn get(&self, name: &str) -> Option<&Rc<StructDef>> {
        self.defs.get(name)
    }

    pub fn field_type(&self, type_name: &str, field: &str) -> Option<&Type> {
        self.defs
            .get(type_name)?
            .fields
            .iter()
            .find(|(n, _)| n == field)
            .map(|(_, t)| t)
    }

    pub fn instantiate(&self, type_name: &str) -> Result<RecordRef, EvalError> {
        let def = self.defs.get(type_name).ok_or_else(|| {
            EvalError::Type(format!("{} is not a declared struct type", type_name))
        })?;
        let fields = def
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), ty.default_value()))
            .collect();
        Ok(Rc::new(RefCell::new(Record {
            type_name: type_name.to_string(),
            fields,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_reference_resolves() {
        let structs = vec![StructDef {
            name: "Node".into(),
            fields: vec![
                ("v".into(), Type::Int),
                ("next".into(), Type::Struct("Node".into())),
            ],
        }];
        let registry = StructRegistry::register_all(structs).unwrap();
        let rec = registry.instantiate("Node").unwrap();
        assert_eq!(rec.borrow().fields["v"], Value::Int(0));
        assert_eq!(rec.borrow().fields["next"], Value::Nil);
    }

    #[test]
    fn unknown_field_type_is_a_type_error() {
        let structs = vec![StructDef {
            name: "N".into(),
            fields: vec![("x".into(), Type::Struct("Missing".into()))],
        }];
        assert!(StructRegistry::register_all(structs).is_err());
    }
}
