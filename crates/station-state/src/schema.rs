use regex::Regex;
use serde_json::Value;
use station_types::DataType;
use std::sync::LazyLock;

/// 可选符号、整数部分、可选小数、可选单个空白、可选字母单位
static VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?[0-9]+(?:\.[0-9]+)?)\s?([a-zA-Z]*)$").expect("invalid value pattern")
});

/// 数值解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedValue {
    pub number: f64,
    pub unit: Option<String>,
}

/// 把原始文本解析为带单位的数值
///
/// 例如 `"65 MHz"` -> `65.0` / `MHz`，`"-3.5"` -> `-3.5` / 无单位。
/// 不匹配时返回 `None`，调用方按不透明文本处理。
pub fn parse_value(raw: &str) -> Option<ParsedValue> {
    let captures = VALUE_PATTERN.captures(raw)?;
    let number = captures.get(1)?.as_str().parse::<f64>().ok()?;
    let unit = captures
        .get(2)
        .map(|m| m.as_str())
        .filter(|unit| !unit.is_empty())
        .map(str::to_string);

    Some(ParsedValue { number, unit })
}

/// 字段分类结果：声明类型、单位和实际写入的值
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub data_type: DataType,
    pub unit: Option<String>,
    pub value: Value,
}

impl Classification {
    fn mixed(value: Value) -> Self {
        Self {
            data_type: DataType::Mixed,
            unit: None,
            value,
        }
    }
}

/// 对原始 JSON 值分类
///
/// 数组和对象一律存为 JSON 字符串并声明为 `mixed`，不做数值解析。
pub fn classify(raw: &Value) -> Classification {
    match raw {
        Value::Array(_) | Value::Object(_) => Classification::mixed(Value::String(raw.to_string())),
        Value::String(text) => match parse_value(text) {
            // 超出 f64 范围的数字串无法写成 JSON 数值
            Some(parsed) if !parsed.number.is_finite() => Classification::mixed(raw.clone()),
            Some(parsed) => Classification {
                data_type: DataType::Number,
                value: numeric_value(text, parsed.number),
                unit: parsed.unit,
            },
            None => Classification::mixed(raw.clone()),
        },
        Value::Number(_) => Classification {
            data_type: DataType::Number,
            unit: None,
            value: raw.clone(),
        },
        Value::Bool(_) | Value::Null => Classification::mixed(raw.clone()),
    }
}

/// 整数文本保持整数形式，避免 `5` 变成 `5.0`
fn numeric_value(text: &str, number: f64) -> Value {
    let token = text
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim_end();
    if !token.contains('.') {
        if let Ok(integer) = token.trim_start_matches('+').parse::<i64>() {
            return Value::from(integer);
        }
    }
    Value::from(number)
}
