//! Object model: the heap, property storage, and the internal kinds an object can have.
//!
//! Objects are never freed individually. Each evaluation owns one [`Heap`] and drops it whole when the
//! evaluation ends, which keeps closures and prototype cycles trivially sound. Growth is bounded by the heap's
//! object limit instead.

use std::collections::HashMap;
use std::rc::Rc;

use proctor_syntax::ast::{ClassDef, FunctionDef};

use super::dom::{ElementData, TextData};
use super::interpreter::Interpreter;
use super::scope::ScopeRef;
use super::value::{ObjectId, Value};
use super::Completion;

/// Host function signature. Closures may capture host state (the test harness, a matcher's operand).
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, CallArgs<'_>) -> Completion<Value>>;

/// Arguments handed to a native function.
pub struct CallArgs<'a> {
    pub this: Value,
    pub args: &'a [Value],
    /// The constructor `new` was applied to, when called as a constructor.
    pub new_target: Option<ObjectId>,
}

impl CallArgs<'_> {
    /// The `i`th argument, or `undefined`.
    pub fn arg(&self, i: usize) -> Value {
        self.args.get(i).cloned().unwrap_or(Value::Undefined)
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
    pub writable: bool,
}

impl Property {
    pub fn data(value: Value) -> Self {
        Self {
            value,
            enumerable: true,
            writable: true,
        }
    }

    /// Methods and intrinsic slots: writable, hidden from enumeration.
    pub fn hidden(value: Value) -> Self {
        Self {
            value,
            enumerable: false,
            writable: true,
        }
    }

    pub fn frozen(value: Value) -> Self {
        Self {
            value,
            enumerable: false,
            writable: false,
        }
    }
}

/// Insertion-ordered string-keyed property storage.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(Rc<str>, Property)>,
    index: HashMap<Rc<str>, usize>,
}

impl PropertyMap {
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Property> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn insert(&mut self, key: Rc<str>, prop: Property) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = prop;
        } else {
            self.index.insert(Rc::clone(&key), self.entries.len());
            self.entries.push((key, prop));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Property> {
        let i = self.index.remove(key)?;
        let (_, prop) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(prop)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Property)> {
        self.entries.iter().map(|(k, p)| (k, p))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.entries.iter_mut().map(|(_, p)| p)
    }
}

/// A function written in script.
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub scope: ScopeRef,
    /// Object whose prototype `super.x` resolves against (methods only).
    pub home_object: Option<ObjectId>,
}

pub struct NativeFunction {
    pub call: NativeFn,
    pub constructor: bool,
}

pub struct BoundFunction {
    pub target: ObjectId,
    pub this: Value,
    pub args: Vec<Value>,
}

/// A class constructor.
pub struct ClassData {
    pub def: Rc<ClassDef>,
    pub scope: ScopeRef,
    /// Parent constructor for `extends`; `None` for base classes.
    pub parent: Option<ObjectId>,
    pub prototype: ObjectId,
    /// Instance fields in declaration order: resolved key and index into `def.members`.
    pub fields: Vec<(Rc<str>, usize)>,
}

pub enum FunctionData {
    Script(Closure),
    Native(NativeFunction),
    Bound(BoundFunction),
    Class(ClassData),
}

/// Internal kind of an object, the equivalent of its hidden slots.
pub enum ObjectKind {
    Ordinary,
    Array(Vec<Value>),
    Function(FunctionData),
    /// Instances created by the `Error` constructors.
    Error,
    Element(ElementData),
    Text(TextData),
}

pub struct Object {
    pub proto: Option<ObjectId>,
    pub kind: ObjectKind,
    pub props: PropertyMap,
    pub extensible: bool,
}

impl Object {
    pub fn new(kind: ObjectKind, proto: Option<ObjectId>) -> Self {
        Self {
            proto,
            kind,
            props: PropertyMap::default(),
            extensible: true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(FunctionData::Script(c)) => {
                matches!(c.def.kind, proctor_syntax::ast::FunctionKind::Normal)
            }
            ObjectKind::Function(FunctionData::Native(n)) => n.constructor,
            ObjectKind::Function(FunctionData::Class(_)) => true,
            ObjectKind::Function(FunctionData::Bound(_)) => false,
            _ => false,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match &self.kind {
            ObjectKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.kind {
            ObjectKind::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// The heap ran out of object slots.
#[derive(Debug, Clone, Copy)]
pub struct HeapExhausted;

/// Arena owning every object created during one evaluation.
pub struct Heap {
    objects: Vec<Object>,
    limit: usize,
}

impl Heap {
    pub fn new(limit: usize) -> Self {
        Self {
            objects: Vec::with_capacity(1024),
            limit,
        }
    }

    pub fn alloc(&mut self, object: Object) -> Result<ObjectId, HeapExhausted> {
        if self.objects.len() >= self.limit {
            return Err(HeapExhausted);
        }
        let id = ObjectId(u32::try_from(self.objects.len()).map_err(|_| HeapExhausted)?);
        self.objects.push(object);
        Ok(id)
    }

    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_map_keeps_insertion_order() {
        let mut map = PropertyMap::default();
        map.insert("b".into(), Property::data(Value::from(1.0)));
        map.insert("a".into(), Property::data(Value::from(2.0)));
        map.insert("b".into(), Property::data(Value::from(3.0)));
        let keys: Vec<&str> = map.iter().map(|(k, _)| &**k).collect();
        assert_eq!(keys, ["b", "a"]);
        assert!(matches!(map.get("b").map(|p| &p.value), Some(Value::Number(n)) if *n == 3.0));
    }

    #[test]
    fn test_property_map_remove_reindexes() {
        let mut map = PropertyMap::default();
        for key in ["x", "y", "z"] {
            map.insert(key.into(), Property::data(Value::Null));
        }
        assert!(map.remove("x").is_some());
        assert!(map.remove("x").is_none());
        assert!(map.get("z").is_some());
        map.insert("w".into(), Property::data(Value::Null));
        let keys: Vec<&str> = map.iter().map(|(k, _)| &**k).collect();
        assert_eq!(keys, ["y", "z", "w"]);
    }

    #[test]
    fn test_heap_limit() {
        let mut heap = Heap::new(2);
        assert!(heap.alloc(Object::new(ObjectKind::Ordinary, None)).is_ok());
        assert!(heap.alloc(Object::new(ObjectKind::Ordinary, None)).is_ok());
        assert!(heap.alloc(Object::new(ObjectKind::Ordinary, None)).is_err());
        assert_eq!(heap.len(), 2);
    }
}
