//! Table value types

/// Value stored under a table key
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean flag
    Boolean(bool),
    /// Double-precision number
    Number(f64),
    /// Text value
    Text(String),
    /// Ordered list of text values
    TextArray(Vec<String>),
}

impl Value {
    /// Borrow as bool, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as f64, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow as str, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as string slice list, if this is a text array
    pub fn as_text_array(&self) -> Option<&[String]> {
        match self {
            Value::TextArray(items) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::TextArray(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::TextArray(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Text("x".into()).as_text(), Some("x"));
        assert_eq!(Value::Boolean(true).as_text(), None);

        let arr = Value::TextArray(vec!["a".into(), "b".into()]);
        assert_eq!(arr.as_text_array().unwrap().len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(30.0).to_string(), "30");
        assert_eq!(
            Value::TextArray(vec!["a".into(), "b".into()]).to_string(),
            "[a, b]"
        );
    }
}
