// Parameter schemas for tools, and validation of incoming arguments against them

use super::registry::{
    json_schema_boolean, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string,
};
use crate::protocol::ToolSchema;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Scalar type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Number,
    String,
    Boolean,
    /// ISO-8601 calendar date (`YYYY-MM-DD`), carried as a string
    Date,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Date => "date (YYYY-MM-DD)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    /// Lower bound for integer and number parameters
    pub minimum: Option<i64>,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
            minimum: None,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = match self.param_type {
            ParamType::Integer => json_schema_integer(&self.description),
            ParamType::Number => json_schema_number(&self.description),
            ParamType::String => json_schema_string(&self.description),
            ParamType::Boolean => json_schema_boolean(&self.description),
            ParamType::Date => {
                let mut schema = json_schema_string(&self.description);
                schema["format"] = Value::from("date");
                schema
            }
        };

        if let Some(default) = &self.default {
            schema["default"] = default.clone();
        }
        if let Some(minimum) = self.minimum {
            schema["minimum"] = Value::from(minimum);
        }
        schema
    }

    fn from_json_schema(name: &str, schema: &Value, required: bool) -> Result<Self, SchemaError> {
        let invalid = |reason: String| SchemaError {
            parameter: name.to_string(),
            reason,
        };

        let type_name = schema
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing \"type\"".to_string()))?;
        let format = schema.get("format").and_then(Value::as_str);

        let param_type = match (type_name, format) {
            ("string", Some("date")) => ParamType::Date,
            ("string", _) => ParamType::String,
            ("integer", _) => ParamType::Integer,
            ("number", _) => ParamType::Number,
            ("boolean", _) => ParamType::Boolean,
            (other, _) => return Err(invalid(format!("unsupported type \"{other}\""))),
        };

        Ok(Self {
            name: name.to_string(),
            param_type,
            required,
            default: schema.get("default").cloned(),
            minimum: schema.get("minimum").and_then(Value::as_i64),
            description: schema
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Coerce a supplied value to this parameter's type
    fn coerce(&self, value: &Value) -> Result<Value, ValidationError> {
        let mismatch = || ValidationError::TypeMismatch {
            name: self.name.clone(),
            expected: self.param_type,
            got: value_kind(value).to_string(),
        };

        let coerced = match (self.param_type, value) {
            (ParamType::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    value.clone()
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                            Value::from(f as i64)
                        }
                        _ => return Err(mismatch()),
                    }
                }
            }
            (ParamType::Integer, Value::String(s)) => {
                Value::from(s.trim().parse::<i64>().map_err(|_| mismatch())?)
            }
            (ParamType::Number, Value::Number(_)) => value.clone(),
            (ParamType::Number, Value::String(s)) => {
                let parsed = s.trim().parse::<f64>().map_err(|_| mismatch())?;
                serde_json::Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or_else(mismatch)?
            }
            (ParamType::String, Value::String(_)) => value.clone(),
            (ParamType::Boolean, Value::Bool(_)) => value.clone(),
            (ParamType::Boolean, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(mismatch()),
            },
            (ParamType::Date, Value::String(s)) => {
                let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| mismatch())?;
                Value::from(date.to_string())
            }
            _ => return Err(mismatch()),
        };

        if let Some(minimum) = self.minimum {
            let below = coerced
                .as_f64()
                .map(|n| n < minimum as f64)
                .unwrap_or(false);
            if below {
                return Err(ValidationError::BelowMinimum {
                    name: self.name.clone(),
                    minimum,
                });
            }
        }

        Ok(coerced)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Name, description and parameter schema of a registered tool.
///
/// On the wire a descriptor travels as a [`ToolSchema`] whose `inputSchema`
/// lists the parameters in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ToolSchema", try_from = "ToolSchema")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            properties.insert(param.name.clone(), param.json_schema());
        }

        let mut schema = json_schema_object(Value::Object(properties), self.required_params().collect());
        schema["additionalProperties"] = Value::Bool(false);
        schema
    }

    pub fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
        }
    }

    pub fn from_schema(schema: &ToolSchema) -> Result<Self, SchemaError> {
        let required: Vec<&str> = schema
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut descriptor = Self::new(&schema.name, &schema.description);
        if let Some(properties) = schema.input_schema.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                descriptor.params.push(ParamSpec::from_json_schema(
                    name,
                    property,
                    required.contains(&name.as_str()),
                )?);
            }
        }

        Ok(descriptor)
    }

    /// Check `params` against this schema and return the coerced arguments.
    ///
    /// Unknown parameters are rejected. An explicit `null` counts as absent;
    /// absent optional parameters take their default when one is declared.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<Arguments, ValidationError> {
        if let Some(unknown) = params
            .keys()
            .find(|key| !self.params.iter().any(|p| &p.name == *key))
        {
            return Err(ValidationError::Unknown(unknown.clone()));
        }

        let mut arguments = Map::new();
        for spec in &self.params {
            match params.get(&spec.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    arguments.insert(spec.name.clone(), spec.coerce(value)?);
                }
                None if spec.required => return Err(ValidationError::Missing(spec.name.clone())),
                None => {
                    if let Some(default) = &spec.default {
                        arguments.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(Arguments(arguments))
    }
}

impl From<ToolDescriptor> for ToolSchema {
    fn from(descriptor: ToolDescriptor) -> Self {
        descriptor.to_schema()
    }
}

impl TryFrom<ToolSchema> for ToolDescriptor {
    type Error = SchemaError;

    fn try_from(schema: ToolSchema) -> Result<Self, Self::Error> {
        Self::from_schema(&schema)
    }
}

/// Arguments that passed validation, with defaults filled in
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Decode into a handler's typed argument struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required parameter '{0}'")]
    Missing(String),

    #[error("unknown parameter '{0}'")]
    Unknown(String),

    #[error("parameter '{name}' expected {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        got: String,
    },

    #[error("parameter '{name}' must be at least {minimum}")]
    BelowMinimum { name: String, minimum: i64 },
}

impl ValidationError {
    pub fn parameter(&self) -> &str {
        match self {
            Self::Missing(name) | Self::Unknown(name) => name,
            Self::TypeMismatch { name, .. } | Self::BelowMinimum { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema for parameter '{parameter}': {reason}")]
pub struct SchemaError {
    pub parameter: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn top_selling() -> ToolDescriptor {
        ToolDescriptor::new("GetTopSellingProducts", "Top products for a shop")
            .param(ParamSpec::required("shop_id", ParamType::Integer, "Shop to query").with_minimum(1))
            .param(
                ParamSpec::optional("limit", ParamType::Integer, "How many products")
                    .with_default(5)
                    .with_minimum(0),
            )
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_validate_applies_defaults() {
        let args = top_selling().validate(&params(json!({"shop_id": 1}))).unwrap();
        assert_eq!(args.get("shop_id"), Some(&json!(1)));
        assert_eq!(args.get("limit"), Some(&json!(5)));
    }

    #[test]
    fn test_validate_missing_required() {
        let err = top_selling().validate(&params(json!({"limit": 3}))).unwrap_err();
        assert_eq!(err, ValidationError::Missing("shop_id".to_string()));
        assert_eq!(err.parameter(), "shop_id");
    }

    #[test]
    fn test_validate_rejects_unknown_parameters() {
        let err = top_selling()
            .validate(&params(json!({"shop_id": 1, "region": "North"})))
            .unwrap_err();
        assert_eq!(err, ValidationError::Unknown("region".to_string()));
    }

    #[test]
    fn test_validate_coerces_numeric_strings() {
        let args = top_selling()
            .validate(&params(json!({"shop_id": "2", "limit": 3.0})))
            .unwrap();
        assert_eq!(args.get("shop_id"), Some(&json!(2)));
        assert_eq!(args.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let err = top_selling()
            .validate(&params(json!({"shop_id": "two"})))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch { ref name, expected: ParamType::Integer, ref got }
                if name == "shop_id" && got == "string"
        ));

        let err = top_selling()
            .validate(&params(json!({"shop_id": 1.5})))
            .unwrap_err();
        assert_eq!(err.parameter(), "shop_id");
    }

    #[test]
    fn test_validate_minimum() {
        let err = top_selling()
            .validate(&params(json!({"shop_id": 1, "limit": -1})))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::BelowMinimum {
                name: "limit".to_string(),
                minimum: 0
            }
        );

        let args = top_selling()
            .validate(&params(json!({"shop_id": 1, "limit": 0})))
            .unwrap();
        assert_eq!(args.get("limit"), Some(&json!(0)));
    }

    #[test]
    fn test_validate_null_counts_as_absent() {
        let descriptor = ToolDescriptor::new("GetCustomerOrders", "Orders")
            .param(ParamSpec::required("customer_id", ParamType::Integer, "Customer"))
            .param(ParamSpec::optional("start_date", ParamType::Date, "From"));

        let args = descriptor
            .validate(&params(json!({"customer_id": 5, "start_date": null})))
            .unwrap();
        assert!(args.get("start_date").is_none());

        let err = descriptor
            .validate(&params(json!({"customer_id": null})))
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("customer_id".to_string()));
    }

    #[test]
    fn test_validate_dates() {
        let descriptor = ToolDescriptor::new("GetCustomerOrders", "Orders")
            .param(ParamSpec::optional("start_date", ParamType::Date, "From"));

        let args = descriptor
            .validate(&params(json!({"start_date": " 2024-02-01 "})))
            .unwrap();
        assert_eq!(args.get("start_date"), Some(&json!("2024-02-01")));

        let err = descriptor
            .validate(&params(json!({"start_date": "01/02/2024"})))
            .unwrap_err();
        assert_eq!(err.parameter(), "start_date");
    }

    #[test]
    fn test_validate_booleans_and_numbers() {
        let descriptor = ToolDescriptor::new("Example", "Example")
            .param(ParamSpec::optional("verbose", ParamType::Boolean, "Verbose"))
            .param(ParamSpec::optional("ratio", ParamType::Number, "Ratio"));

        let args = descriptor
            .validate(&params(json!({"verbose": "TRUE", "ratio": "0.25"})))
            .unwrap();
        assert_eq!(args.get("verbose"), Some(&json!(true)));
        assert_eq!(args.get("ratio"), Some(&json!(0.25)));
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = top_selling().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["shop_id"]));
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["limit"]["default"], 5);
        assert_eq!(schema["properties"]["limit"]["minimum"], 0);

        let names: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["shop_id", "limit"]);
    }

    #[test]
    fn test_descriptor_survives_wire_schema() {
        let descriptor = top_selling().param(ParamSpec::optional("since", ParamType::Date, "Since"));

        let text = serde_json::to_string(&descriptor).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("inputSchema").is_some());

        let back: ToolDescriptor = serde_json::from_str(&text).unwrap();
        assert_eq!(back, descriptor);
    }

    #[test]
    fn test_from_schema_rejects_unknown_types() {
        let schema = ToolSchema {
            name: "Broken".to_string(),
            description: String::new(),
            input_schema: json!({"type": "object", "properties": {"tags": {"type": "array"}}}),
        };

        let err = ToolDescriptor::from_schema(&schema).unwrap_err();
        assert_eq!(err.parameter, "tags");
    }

    #[test]
    fn test_decode_into_typed_arguments() {
        #[derive(Deserialize)]
        struct Args {
            shop_id: u64,
            limit: u64,
        }

        let args = top_selling().validate(&params(json!({"shop_id": "4"}))).unwrap();
        let decoded: Args = args.decode().unwrap();
        assert_eq!(decoded.shop_id, 4);
        assert_eq!(decoded.limit, 5);
    }
}
