/// 表单与模板用的序列化/反序列化辅助模块

use serde::{Deserialize, Deserializer, Serializer};

/// 以人类可读格式输出时间，例如 "04 Apr 2022 20:58"
pub mod display_date {
    use super::*;
    use chrono::{DateTime, Utc};

    pub const FORMAT: &str = "%d %b %Y %H:%M";

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }
}

/// 表单中的可选数字字段：空字符串视为未填写
pub mod empty_string_as_none {
    use super::*;
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawValue {
            String(String),
            Number(i64),
        }

        match Option::<RawValue>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawValue::String(s)) if s.trim().is_empty() => Ok(None),
            Some(RawValue::String(s)) => s
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(RawValue::Number(n)) => n
                .to_string()
                .parse::<T>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
