// Minimal driver: reads a JSON-encoded AST (the external node shape
// `ast::external::Node` deserializes) from a file named on the
// command line, or -- with no real parser wired up -- falls back to
// a hand-built factorial program, in the same spirit as the
// teacher's own `main.rs` hand-constructing a `Config`/`State` when
// no real input source was available.

use std::env;
use std::fs;

use brewin::ast;
use brewin::host::StdioHost;
use brewin::interp;

fn sample_program() -> ast::external::Node {
    use serde_json::json;
    let raw = json!({
        "element_type": "program",
        "children": {
            "functions": [
                {
                    "element_type": "function",
                    "children": {
                        "name": "main",
                        "args": [],
                        "return_type": null,
                        "statements": [{
                            "element_type": "fcall",
                            "children": {
                                "name": "print",
                                "args": [{
                                    "element_type": "fcall",
                                    "children": {
                                        "name": "fact",
                                        "args": [{"element_type": "int", "children": {"value": "5"}}]
                                    }
                                }]
                            }
                        }]
                    }
                },
                {
                    "element_type": "function",
                    "children": {
                        "name": "fact",
                        "args": [{"element_type": "param", "children": {"name": "n", "var_type": "int"}}],
                        "return_type": "int",
                        "statements": [
                            {
                                "element_type": "if",
                                "children": {
                                    "condition": {
                                        "element_type": "<=",
                                        "children": {
                                            "op1": {"element_type": "var", "children": {"name": "n"}},
                                            "op2": {"element_type": "int", "children": {"value": "1"}}
                                        }
                                    },
                                    "statements": [{
                                        "element_type": "return",
                                        "children": {"expression": {"element_type": "int", "children": {"value": "1"}}}
                                    }]
                                }
                            },
                            {
                                "element_type": "return",
                                "children": {
                                    "expression": {
                                        "element_type": "*",
                                        "children": {
                                            "op1": {"element_type": "var", "children": {"name": "n"}},
                                            "op2": {
                                                "element_type": "fcall",
                                                "children": {
                                                    "name": "fact",
                                                    "args": [{
                                                        "element_type": "-",
                                                        "children": {
                                                            "op1": {"element_type": "var", "children": {"name": "n"}},
                                                            "op2": {"element_type": "int", "children": {"value": "1"}}
                                                        }
                                                    }]
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        ]
                    }
                }
            ],
            "structs": []
        }
    });
    serde_json::from_value(raw).expect("built-in sample program is well-formed")
}

fn main() {
    let node = match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path).expect("could not read AST file");
            serde_json::from_str(&text).expect("AST file is not a valid node tree")
        }
        None => sample_program(),
    };

    let program = ast::lower(&node).expect("AST failed to lower");
    let mut host = StdioHost;
    interp::run(program, &mut host);
}
