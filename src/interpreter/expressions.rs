//! Expression evaluation
//!
//! Every expression evaluates to the address of a heap node. Literals allocate
//! a fresh node each time they are evaluated, except `None`, `True` and
//! `False`, which are allocated once and shared. Reading a name yields the
//! bound node itself, so two names can refer to the same identity.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::display;
use crate::memory::value::{Address, Instance, Layout, Value};
use crate::script::ast::*;

impl Interpreter {
    /// Evaluate an expression and return the address of its node
    pub(crate) fn evaluate_expr(&mut self, expr: &Expr) -> Result<Address, RuntimeError> {
        match expr {
            Expr::None(loc) => self.none(*loc),
            Expr::Bool(b, loc) => self.boolean(*b, *loc),
            Expr::Int(n, loc) => self.alloc(Value::Int(*n), *loc),
            Expr::Float(x, loc) => self.alloc(Value::Float(*x), *loc),
            Expr::Str(s, loc) => self.alloc(Value::Str(s.clone()), *loc),
            Expr::Bytes(b, loc) => self.alloc(Value::Bytes(b.clone()), *loc),

            Expr::Name(name, loc) => {
                self.bindings
                    .get(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable {
                        name: name.clone(),
                        location: *loc,
                    })
            }

            Expr::List(items, loc) => {
                let items = self.evaluate_all(items)?;
                self.alloc(Value::List(items), *loc)
            }

            Expr::Tuple(items, loc) => {
                let items = self.evaluate_all(items)?;
                self.alloc(Value::Tuple(items), *loc)
            }

            Expr::Set(items, loc) => {
                let items = self.evaluate_all(items)?;
                let mut members: Vec<Address> = Vec::with_capacity(items.len());
                for item in items {
                    self.check_hashable(item, *loc)?;
                    if !members.iter().any(|m| self.heap.values_equal(*m, item)) {
                        members.push(item);
                    }
                }
                self.alloc(Value::Set(members), *loc)
            }

            Expr::Dict(entries, loc) => {
                let mut pairs: Vec<(Address, Address)> = Vec::with_capacity(entries.len());
                for (key_expr, value_expr) in entries {
                    let key = self.evaluate_expr(key_expr)?;
                    let value = self.evaluate_expr(value_expr)?;
                    self.check_hashable(key, key_expr.location())?;
                    match self.heap.find_key(&pairs, key) {
                        // Later duplicates overwrite the value, the first key stays
                        Some(i) => pairs[i].1 = value,
                        None => pairs.push((key, value)),
                    }
                }
                self.alloc(Value::Dict(pairs), *loc)
            }

            Expr::Call {
                callee,
                args,
                location,
            } => self.construct(callee, args, *location),

            Expr::Attribute {
                object,
                name,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                self.get_attribute(object, name, *location)
            }

            Expr::Index {
                object,
                index,
                location,
            } => {
                let container = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                self.get_item(container, key, *location)
            }

            Expr::MethodCall {
                object,
                method,
                args,
                location,
            } => {
                let receiver = self.evaluate_expr(object)?;
                let args = self.evaluate_all(args)?;
                self.call_method(receiver, method, &args, *location)
            }
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Address>, RuntimeError> {
        exprs.iter().map(|e| self.evaluate_expr(e)).collect()
    }

    /// Allocate a node, attaching the location to heap errors
    pub(crate) fn alloc(
        &mut self,
        value: Value,
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        self.heap
            .allocate(value)
            .map_err(|source| RuntimeError::Heap { source, location })
    }

    pub(crate) fn node(&self, addr: Address, location: SourceLocation) -> Result<&Value, RuntimeError> {
        self.heap
            .get(addr)
            .map_err(|source| RuntimeError::Heap { source, location })
    }

    /// Mutate a node in place; growth counts against the heap limit
    pub(crate) fn update_node<F>(
        &mut self,
        addr: Address,
        location: SourceLocation,
        mutate: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnOnce(&mut Value),
    {
        self.heap
            .update(addr, mutate)
            .map_err(|source| RuntimeError::Heap { source, location })
    }

    fn none(&mut self, location: SourceLocation) -> Result<Address, RuntimeError> {
        if let Some(addr) = self.none_addr {
            return Ok(addr);
        }
        let addr = self.alloc(Value::None, location)?;
        self.none_addr = Some(addr);
        Ok(addr)
    }

    fn boolean(&mut self, value: bool, location: SourceLocation) -> Result<Address, RuntimeError> {
        if let Some(addr) = self.bool_addrs[value as usize] {
            return Ok(addr);
        }
        let addr = self.alloc(Value::Bool(value), location)?;
        self.bool_addrs[value as usize] = Some(addr);
        Ok(addr)
    }

    /// The shared `Str` node for an attribute name
    pub(crate) fn intern(
        &mut self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        if let Some(addr) = self.interned.get(name) {
            return Ok(*addr);
        }
        let addr = self.alloc(Value::Str(name.to_string()), location)?;
        self.interned.insert(name.to_string(), addr);
        Ok(addr)
    }

    pub(crate) fn check_hashable(
        &self,
        addr: Address,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        self.node(addr, location)?;
        match self.heap.unhashable_type(addr) {
            None => Ok(()),
            Some(type_name) => Err(RuntimeError::Unhashable {
                type_name: type_name.to_string(),
                location,
            }),
        }
    }

    /// Map a possibly negative index onto `0..len`
    pub(crate) fn resolve_index(
        &self,
        index: Address,
        len: usize,
        location: SourceLocation,
    ) -> Result<usize, RuntimeError> {
        let value = self.node(index, location)?;
        let Some(n) = value.as_int() else {
            return Err(RuntimeError::TypeError {
                message: format!("indices must be integers, not '{}'", value.type_name()),
                location,
            });
        };
        let resolved = if n < 0 { n + len as i64 } else { n };
        if resolved < 0 || resolved >= len as i64 {
            return Err(RuntimeError::IndexOutOfRange {
                index: n,
                len,
                location,
            });
        }
        Ok(resolved as usize)
    }

    /// Instantiate a script class
    fn construct(
        &mut self,
        callee: &str,
        args: &[Expr],
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        let class = self
            .classes
            .get(callee)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownClass {
                name: callee.to_string(),
                location,
            })?;

        if args.len() != class.fields.len() {
            return Err(RuntimeError::ArgumentCountMismatch {
                callee: class.name,
                expected: class.fields.len(),
                got: args.len(),
                location,
            });
        }

        let values = self.evaluate_all(args)?;
        let fields = class.fields.iter().cloned().zip(values);

        let layout = if class.slots {
            Layout::Slots(fields.collect())
        } else {
            let mut pairs = Vec::with_capacity(class.fields.len());
            for (name, value) in fields {
                pairs.push((self.intern(&name, location)?, value));
            }
            Layout::Table(self.alloc(Value::Dict(pairs), location)?)
        };

        log::trace!("constructing {} ({} fields)", class.name, class.fields.len());
        self.alloc(
            Value::Object(Instance {
                class_name: class.name,
                layout,
            }),
            location,
        )
    }

    fn get_attribute(
        &self,
        object: Address,
        name: &str,
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        let value = self.node(object, location)?;
        let found = match value {
            Value::Object(instance) => match &instance.layout {
                Layout::Slots(slots) => slots
                    .iter()
                    .find(|(field, _)| field == name)
                    .map(|(_, addr)| *addr),
                Layout::Table(table) => match self.node(*table, location)? {
                    Value::Dict(pairs) => pairs
                        .iter()
                        .find(|(key, _)| {
                            self.heap.get(*key).ok().and_then(Value::as_str) == Some(name)
                        })
                        .map(|(_, addr)| *addr),
                    _ => None,
                },
            },
            _ => None,
        };

        found.ok_or_else(|| RuntimeError::UnknownAttribute {
            type_name: value.type_name().to_string(),
            attribute: name.to_string(),
            location,
        })
    }

    fn get_item(
        &self,
        container: Address,
        key: Address,
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        match self.node(container, location)? {
            Value::List(items) | Value::Tuple(items) => {
                let index = self.resolve_index(key, items.len(), location)?;
                Ok(items[index])
            }
            Value::Dict(pairs) => match self.heap.find_key(pairs, key) {
                Some(i) => Ok(pairs[i].1),
                None => Err(RuntimeError::MissingKey {
                    key: display::short_repr(&self.heap, key, 64),
                    location,
                }),
            },
            other => Err(RuntimeError::TypeError {
                message: format!("'{}' object is not subscriptable", other.type_name()),
                location,
            }),
        }
    }

    /// Elements of an iterable in iteration order (dicts yield their keys)
    fn iterate(&self, addr: Address, location: SourceLocation) -> Result<Vec<Address>, RuntimeError> {
        match self.node(addr, location)? {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items.clone()),
            Value::Dict(pairs) => Ok(pairs.iter().map(|(k, _)| *k).collect()),
            other => Err(RuntimeError::TypeError {
                message: format!("'{}' object is not iterable", other.type_name()),
                location,
            }),
        }
    }

    fn call_method(
        &mut self,
        receiver: Address,
        method: &str,
        args: &[Address],
        location: SourceLocation,
    ) -> Result<Address, RuntimeError> {
        let type_name = self.node(receiver, location)?.type_name().to_string();
        let expect_one = |args: &[Address]| -> Result<Address, RuntimeError> {
            match args {
                [arg] => Ok(*arg),
                _ => Err(RuntimeError::ArgumentCountMismatch {
                    callee: format!("{}.{}", type_name, method),
                    expected: 1,
                    got: args.len(),
                    location,
                }),
            }
        };

        match (type_name.as_str(), method) {
            ("list", "append") => {
                let item = expect_one(args)?;
                self.update_node(receiver, location, |value| {
                    if let Value::List(items) = value {
                        items.push(item);
                    }
                })?;
            }
            ("list", "extend") => {
                let source = expect_one(args)?;
                let extra = self.iterate(source, location)?;
                self.update_node(receiver, location, |value| {
                    if let Value::List(items) = value {
                        items.extend(extra);
                    }
                })?;
            }
            ("set", "add") => {
                let item = expect_one(args)?;
                self.check_hashable(item, location)?;
                let present = match self.node(receiver, location)? {
                    Value::Set(items) => items.iter().any(|m| self.heap.values_equal(*m, item)),
                    _ => false,
                };
                if !present {
                    self.update_node(receiver, location, |value| {
                        if let Value::Set(items) = value {
                            items.push(item);
                        }
                    })?;
                }
            }
            _ => {
                return Err(RuntimeError::UnknownMethod {
                    type_name: type_name.clone(),
                    method: method.to_string(),
                    location,
                })
            }
        }

        self.none(location)
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::Interpreter;
    use crate::interpreter::errors::RuntimeError;
    use crate::memory::value::Value;
    use crate::script::parser::Parser;

    fn run(source: &str) -> (Interpreter, Result<(), RuntimeError>) {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        let mut interp = Interpreter::new(program, 64 * 1024 * 1024);
        let result = interp.run();
        (interp, result)
    }

    #[test]
    fn test_literals_allocate_fresh_nodes() {
        let (interp, result) = run("a = \"x\"\nb = \"x\"\nc = a\n");
        assert!(result.is_ok());
        let a = interp.bindings().get("a").unwrap();
        assert_ne!(Some(a), interp.bindings().get("b"));
        assert_eq!(Some(a), interp.bindings().get("c"));
    }

    #[test]
    fn test_singletons_are_shared() {
        let (interp, result) = run("a = None\nb = [None, True, True]\nc = False\n");
        assert!(result.is_ok());
        let a = interp.bindings().get("a").unwrap();
        let b = interp.bindings().get("b").unwrap();
        let Ok(Value::List(items)) = interp.heap().get(b) else {
            panic!("b is not a list");
        };
        assert_eq!(items[0], a);
        assert_eq!(items[1], items[2]);
        assert_ne!(Some(items[1]), interp.bindings().get("c"));
    }

    #[test]
    fn test_attribute_names_are_interned() {
        let (interp, result) = run("class P(name)\np = P(1)\nq = P(2)\n");
        assert!(result.is_ok());
        let keys: Vec<_> = ["p", "q"]
            .iter()
            .map(|var| {
                let addr = interp.bindings().get(var).unwrap();
                let Ok(Value::Object(instance)) = interp.heap().get(addr) else {
                    panic!("not an instance");
                };
                let crate::memory::value::Layout::Table(table) = instance.layout else {
                    panic!("expected table layout");
                };
                let Ok(Value::Dict(pairs)) = interp.heap().get(table) else {
                    panic!("table is not a dict");
                };
                pairs[0].0
            })
            .collect();
        assert_eq!(keys[0], keys[1]);
    }

    #[test]
    fn test_attribute_and_index_reads() {
        let (interp, result) = run(
            "class P(x)\nslots class S(y)\np = P([10, 20])\ns = S({\"k\": (1, 2)})\nprint p.x[-2]\nprint s.y[\"k\"][1]\n",
        );
        assert!(result.is_ok());
        assert_eq!(interp.transcript().get_output(), vec!["10", "2"]);
    }

    #[test]
    fn test_set_and_dict_deduplicate() {
        let (interp, result) = run("s = {1, 1.0, True, 2}\nd = {1: \"a\", 1: \"b\"}\nprint s\nprint d\n");
        assert!(result.is_ok());
        assert_eq!(interp.transcript().get_output(), vec!["{1, 2}", "{1: 'b'}"]);
    }

    #[test]
    fn test_methods() {
        let (interp, result) = run(
            "xs = [1]\nxs.append(2)\nxs.extend((3, 4))\ns = {1}\ns.add(1)\ns.add(\"a\")\nprint xs\nprint s\n",
        );
        assert!(result.is_ok());
        assert_eq!(
            interp.transcript().get_output(),
            vec!["[1, 2, 3, 4]", "{1, 'a'}"]
        );
    }

    fn error_for(source: &str) -> RuntimeError {
        let (_, result) = run(source);
        result.expect_err(source)
    }

    #[test]
    fn test_lookup_errors() {
        assert!(matches!(
            error_for("print y\n"),
            RuntimeError::UndefinedVariable { .. }
        ));
        assert!(matches!(
            error_for("x = Q(1)\n"),
            RuntimeError::UnknownClass { .. }
        ));
        assert!(matches!(
            error_for("class P(a)\nx = P()\n"),
            RuntimeError::ArgumentCountMismatch {
                expected: 1,
                got: 0,
                ..
            }
        ));
        assert!(matches!(
            error_for("class P(a)\nx = P(1)\nprint x.b\n"),
            RuntimeError::UnknownAttribute { .. }
        ));
    }

    #[test]
    fn test_container_errors() {
        assert!(matches!(
            error_for("x = [1]\nprint x[1]\n"),
            RuntimeError::IndexOutOfRange {
                index: 1,
                len: 1,
                ..
            }
        ));
        assert!(matches!(
            error_for("x = {}\nprint x[\"k\"]\n"),
            RuntimeError::MissingKey { key, .. } if key == "'k'"
        ));
        assert!(matches!(
            error_for("x = {[1]: 2}\n"),
            RuntimeError::Unhashable { .. }
        ));
        assert!(matches!(
            error_for("x = {1}\nx.add({})\n"),
            RuntimeError::Unhashable { .. }
        ));
        assert!(matches!(
            error_for("x = 5\nprint x[0]\n"),
            RuntimeError::TypeError { .. }
        ));
    }

    #[test]
    fn test_method_errors() {
        assert!(matches!(
            error_for("x = [1]\nx.push(2)\n"),
            RuntimeError::UnknownMethod { .. }
        ));
        assert!(matches!(
            error_for("x = [1]\nx.append(1, 2)\n"),
            RuntimeError::ArgumentCountMismatch { got: 2, .. }
        ));
        assert!(matches!(
            error_for("x = [1]\nx.extend(3)\n"),
            RuntimeError::TypeError { .. }
        ));
    }

    #[test]
    fn test_heap_exhaustion_reports_location() {
        let program = Parser::new("a = \"x\"\nb = [1, 2, 3, 4, 5, 6]\n")
            .unwrap()
            .parse_program()
            .unwrap();
        let mut interp = Interpreter::with_heap_limit(program, 1024 * 1024, 100);
        match interp.run() {
            Err(RuntimeError::Heap { location, .. }) => assert_eq!(location.line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
