//! Streaming JSON generator for request bodies.
//!
//! A thin well-formedness-enforcing wrapper, grounded on the way `api.rs`
//! assembles request bodies by hand via `serde_json::json!`/`Value`
//! construction — here made explicit as a builder so callers cannot forget
//! a key before a value, matching the source's `gcli_jsongen` discipline.

use serde_json::{Map, Value};

enum Frame {
   Object(Map<String, Value>, Option<String>),
   Array(Vec<Value>),
}

/// Streaming JSON builder. `objmember` must precede a value inside an
/// object; array values need no key.
pub struct JsonGenerator {
   stack: Vec<Frame>,
   root:  Option<Value>,
}

impl JsonGenerator {
   #[must_use]
   pub fn new() -> Self {
      Self { stack: Vec::new(), root: None }
   }

   pub fn begin_object(&mut self) -> &mut Self {
      self.stack.push(Frame::Object(Map::new(), None));
      self
   }

   pub fn end_object(&mut self) -> &mut Self {
      match self.stack.pop() {
         Some(Frame::Object(map, None)) => self.push_value(Value::Object(map)),
         Some(Frame::Object(_, Some(key))) => {
            panic!("end_object called with a pending key '{key}' awaiting a value")
         },
         _ => panic!("end_object called without a matching begin_object"),
      }
      self
   }

   pub fn begin_array(&mut self) -> &mut Self {
      self.stack.push(Frame::Array(Vec::new()));
      self
   }

   pub fn end_array(&mut self) -> &mut Self {
      match self.stack.pop() {
         Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
         _ => panic!("end_array called without a matching begin_array"),
      }
      self
   }

   /// Declares the key for the next value inside the current object.
   pub fn objmember(&mut self, key: impl Into<String>) -> &mut Self {
      match self.stack.last_mut() {
         Some(Frame::Object(_, pending)) => *pending = Some(key.into()),
         _ => panic!("objmember called outside of an object"),
      }
      self
   }

   pub fn string(&mut self, s: impl Into<String>) -> &mut Self {
      self.push_value(Value::String(s.into()));
      self
   }

   pub fn number(&mut self, n: f64) -> &mut Self {
      let value = serde_json::Number::from_f64(n)
         .map(Value::Number)
         .unwrap_or(Value::Null);
      self.push_value(value);
      self
   }

   /// Writes an id as a JSON number (ids are conceptually unsigned 64-bit).
   pub fn id(&mut self, id: u64) -> &mut Self {
      self.push_value(Value::Number(id.into()));
      self
   }

   pub fn bool(&mut self, b: bool) -> &mut Self {
      self.push_value(Value::Bool(b));
      self
   }

   pub fn null(&mut self) -> &mut Self {
      self.push_value(Value::Null);
      self
   }

   fn push_value(&mut self, value: Value) {
      match self.stack.last_mut() {
         None => self.root = Some(value),
         Some(Frame::Array(items)) => items.push(value),
         Some(Frame::Object(map, pending)) => {
            let key = pending
               .take()
               .expect("a value was pushed into an object without a preceding objmember");
            map.insert(key, value);
         },
      }
   }

   /// Consumes the builder and yields the serialised request body.
   #[must_use]
   pub fn to_string(self) -> String {
      self
         .root
         .map(|v| v.to_string())
         .unwrap_or_else(|| "null".to_string())
   }
}

impl Default for JsonGenerator {
   fn default() -> Self {
      Self::new()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn builds_a_simple_object() {
      let mut gen = JsonGenerator::new();
      gen
         .begin_object()
         .objmember("title")
         .string("Fix")
         .objmember("id")
         .id(42)
         .end_object();

      let value: Value = serde_json::from_str(&gen.to_string()).unwrap();
      assert_eq!(value["title"], "Fix");
      assert_eq!(value["id"], 42);
   }

   #[test]
   fn array_values_need_no_key() {
      let mut gen = JsonGenerator::new();
      gen
         .begin_array()
         .string("bug")
         .string("wontfix")
         .end_array();

      let value: Value = serde_json::from_str(&gen.to_string()).unwrap();
      assert_eq!(value, serde_json::json!(["bug", "wontfix"]));
   }

   #[test]
   fn nested_object_in_array() {
      let mut gen = JsonGenerator::new();
      gen.begin_array();
      gen
         .begin_object()
         .objmember("path")
         .string("README")
         .objmember("line")
         .id(3)
         .end_object();
      gen.end_array();

      let value: Value = serde_json::from_str(&gen.to_string()).unwrap();
      assert_eq!(value, serde_json::json!([{"path": "README", "line": 3}]));
   }

   #[test]
   #[should_panic(expected = "outside of an object")]
   fn objmember_outside_object_panics() {
      let mut gen = JsonGenerator::new();
      gen.begin_array();
      gen.objmember("oops");
   }

   #[test]
   fn bool_and_null_values() {
      let mut gen = JsonGenerator::new();
      gen
         .begin_object()
         .objmember("merged")
         .bool(false)
         .objmember("milestone")
         .null()
         .end_object();

      let value: Value = serde_json::from_str(&gen.to_string()).unwrap();
      assert_eq!(value["merged"], false);
      assert!(value["milestone"].is_null());
   }
}
