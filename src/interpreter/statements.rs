//! Statement execution implementation
//!
//! This module handles the execution of all heap script statements:
//!
//! - Class definitions (attribute-table and slotted layouts)
//! - Assignments to names, attributes and subscripts
//! - `sizeof`, `footprint`, `dump` and `print`
//! - Expression statements (method calls)
//!
//! # Implementation
//!
//! All statement execution methods are implemented as `pub(crate)` methods
//! on the [`Interpreter`] struct, allowing them to access and modify the
//! interpreter's state (heap, bindings, transcript, etc.).

use crate::interpreter::engine::{ClassDef, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::measure::Measurement;
use crate::memory::display;
use crate::memory::value::{Address, Layout, Value};
use crate::script::ast::*;
use crate::sizing::{shallow_size, size_report, Visited};

impl Interpreter {
    /// Execute a single statement
    pub(crate) fn execute_statement(&mut self, stmt: &Statement) -> Result<(), RuntimeError> {
        match stmt {
            Statement::ClassDef {
                name,
                fields,
                slots,
                location,
            } => self.execute_class_def(name, fields, *slots, *location),

            Statement::Assign {
                target,
                value,
                location,
            } => {
                // Right-hand side first, then the target's object and index
                let value = self.evaluate_expr(value)?;
                self.execute_assignment(target, value, *location)
            }

            Statement::Footprint { exprs, location } => self.execute_footprint(exprs, *location),

            Statement::Sizeof { expr, location } => {
                let addr = self.evaluate_expr(expr)?;
                let size = shallow_size(&self.heap, addr);
                self.transcript
                    .print(format!("sizeof {} = {} B", expr, size), *location);
                Ok(())
            }

            Statement::Dump { expr, location } => self.execute_dump(expr, *location),

            Statement::Print { expr, location } => {
                let addr = self.evaluate_expr(expr)?;
                let text = display::repr(&self.heap, addr);
                self.transcript.print(text, *location);
                Ok(())
            }

            Statement::Expr { expr, .. } => {
                self.evaluate_expr(expr)?;
                Ok(())
            }
        }
    }

    fn execute_class_def(
        &mut self,
        name: &str,
        fields: &[String],
        slots: bool,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if self.classes.contains_key(name) {
            return Err(RuntimeError::DuplicateClass {
                name: name.to_string(),
                location,
            });
        }

        log::debug!(
            "defining class {} with {} field(s), slots: {}",
            name,
            fields.len(),
            slots
        );
        self.classes.insert(
            name.to_string(),
            ClassDef {
                name: name.to_string(),
                fields: fields.to_vec(),
                slots,
                location,
            },
        );
        Ok(())
    }

    pub(crate) fn execute_assignment(
        &mut self,
        target: &Target,
        value: Address,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                self.bindings.bind(name, value);
                Ok(())
            }
            Target::Attribute { object, name } => {
                let object = self.evaluate_expr(object)?;
                self.set_attribute(object, name, value, location)
            }
            Target::Index { object, index } => {
                let container = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                self.set_item(container, key, value, location)
            }
        }
    }

    /// Deep size of each expression; all roots share one visited set
    fn execute_footprint(
        &mut self,
        exprs: &[Expr],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let roots = exprs
            .iter()
            .map(|expr| Ok((expr.to_string(), self.evaluate_expr(expr)?)))
            .collect::<Result<Vec<_>, RuntimeError>>()?;

        let mut visited = Visited::new();
        let mut measurement = Measurement::new(location);
        for (label, addr) in roots {
            let report = size_report(&self.heap, addr, Some(&mut visited));
            self.transcript.print(
                format!(
                    "footprint {} = {} B ({} node{})",
                    label,
                    report.total,
                    report.node_count(),
                    if report.node_count() == 1 { "" } else { "s" }
                ),
                location,
            );
            measurement.push(label, report, &self.heap);
        }

        if measurement.roots.len() > 1 {
            self.transcript.print(
                format!("footprint total = {} B", measurement.total()),
                location,
            );
        }

        self.record_measurement(measurement);
        Ok(())
    }

    /// `label.attr === repr` for every attribute of an instance, or
    /// `label === repr` for any other node
    fn execute_dump(&mut self, expr: &Expr, location: SourceLocation) -> Result<(), RuntimeError> {
        let addr = self.evaluate_expr(expr)?;
        let lines = match display::attributes(&self.heap, addr) {
            Some(fields) => fields
                .iter()
                .map(|(name, field)| {
                    format!("{}.{} === {}", expr, name, display::repr(&self.heap, *field))
                })
                .collect(),
            None => vec![format!("{} === {}", expr, display::repr(&self.heap, addr))],
        };
        for line in lines {
            self.transcript.print(line, location);
        }
        Ok(())
    }

    /// Bind or rebind an attribute on an instance
    pub(crate) fn set_attribute(
        &mut self,
        object: Address,
        name: &str,
        value: Address,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let layout = match self.node(object, location)? {
            Value::Object(instance) => instance.layout.clone(),
            other => {
                return Err(RuntimeError::UnknownAttribute {
                    type_name: other.type_name().to_string(),
                    attribute: name.to_string(),
                    location,
                })
            }
        };

        match layout {
            Layout::Table(table) => {
                let key = self.intern(name, location)?;
                let position = match self.node(table, location)? {
                    Value::Dict(pairs) => self.heap.find_key(pairs, key),
                    other => {
                        return Err(RuntimeError::TypeError {
                            message: format!("attribute table is a '{}'", other.type_name()),
                            location,
                        })
                    }
                };
                self.update_node(table, location, |node| {
                    if let Value::Dict(pairs) = node {
                        match position {
                            Some(i) => pairs[i].1 = value,
                            None => pairs.push((key, value)),
                        }
                    }
                })
            }
            Layout::Slots(slots) => {
                let Some(index) = slots.iter().position(|(field, _)| field == name) else {
                    let class = self.node(object, location)?.type_name().to_string();
                    return Err(RuntimeError::SlotsCannotGrow {
                        class,
                        attribute: name.to_string(),
                        location,
                    });
                };
                self.update_node(object, location, |node| {
                    if let Value::Object(instance) = node {
                        if let Layout::Slots(slots) = &mut instance.layout {
                            slots[index].1 = value;
                        }
                    }
                })
            }
        }
    }

    /// `container[key] = value` for lists and dicts
    pub(crate) fn set_item(
        &mut self,
        container: Address,
        key: Address,
        value: Address,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match self.node(container, location)? {
            Value::List(items) => {
                let index = self.resolve_index(key, items.len(), location)?;
                self.update_node(container, location, |node| {
                    if let Value::List(items) = node {
                        items[index] = value;
                    }
                })
            }
            Value::Dict(pairs) => {
                let position = self.heap.find_key(pairs, key);
                if position.is_none() {
                    self.check_hashable(key, location)?;
                }
                self.update_node(container, location, |node| {
                    if let Value::Dict(pairs) = node {
                        match position {
                            // The original key object stays in place
                            Some(i) => pairs[i].1 = value,
                            None => pairs.push((key, value)),
                        }
                    }
                })
            }
            other => Err(RuntimeError::TypeError {
                message: format!("'{}' object does not support item assignment", other.type_name()),
                location,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::Interpreter;
    use crate::interpreter::errors::RuntimeError;
    use crate::script::parser::Parser;

    fn run(source: &str) -> (Interpreter, Result<(), RuntimeError>) {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        let mut interp = Interpreter::new(program, 64 * 1024 * 1024);
        let result = interp.run();
        (interp, result)
    }

    #[test]
    fn test_sizeof_is_shallow() {
        let (interp, result) = run("xs = [\"a\", \"b\"]\nsizeof xs\n");
        assert!(result.is_ok());
        assert_eq!(interp.transcript().get_output(), vec!["sizeof xs = 72 B"]);
    }

    #[test]
    fn test_dump_lists_attributes() {
        let (interp, result) = run("class P(x, y)\np = P(1, \"two\")\ndump p\ndump 5\n");
        assert!(result.is_ok());
        assert_eq!(
            interp.transcript().get_output(),
            vec!["p.x === 1", "p.y === 'two'", "5 === 5"]
        );
    }

    #[test]
    fn test_duplicate_class() {
        let (_, result) = run("class A(x)\nclass A(y)\n");
        assert!(matches!(
            result,
            Err(RuntimeError::DuplicateClass { ref name, .. }) if name == "A"
        ));
    }

    #[test]
    fn test_slots_cannot_grow() {
        let (_, result) = run("slots class P(x)\np = P(1)\np.x = 2\np.y = 3\n");
        match result {
            Err(RuntimeError::SlotsCannotGrow {
                class,
                attribute,
                location,
            }) => {
                assert_eq!(class, "P");
                assert_eq!(attribute, "y");
                assert_eq!(location.line, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_item_assignment() {
        let (interp, result) = run("xs = [1, 2]\nxs[-1] = 5\nd = {}\nd[\"k\"] = xs\nd[\"k\"] = 0\nprint xs\nprint d\n");
        assert!(result.is_ok());
        assert_eq!(interp.transcript().get_output(), vec!["[1, 5]", "{'k': 0}"]);
    }

    #[test]
    fn test_tuple_item_assignment_fails() {
        let (_, result) = run("t = (1, 2)\nt[0] = 3\n");
        assert!(matches!(result, Err(RuntimeError::TypeError { .. })));
    }

    #[test]
    fn test_footprint_shares_visited_across_roots() {
        let (interp, result) = run("s = \"shared\"\na = [s]\nb = [s]\nfootprint a, b\n");
        assert!(result.is_ok());
        assert_eq!(
            interp.transcript().get_output(),
            vec![
                "footprint a = 119 B (2 nodes)",
                "footprint b = 64 B (1 node)",
                "footprint total = 183 B",
            ]
        );
        let report = interp.last_report().unwrap();
        assert_eq!(report.total(), 183);
        assert_eq!(interp.reports().len(), 1);
    }
}
