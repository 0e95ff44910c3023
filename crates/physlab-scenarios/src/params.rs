use std::collections::BTreeMap;

use physlab_model::{HarnessError, Result};

pub(crate) type ParamBag = BTreeMap<String, serde_yaml::Value>;

pub(crate) fn get_f32(params: &ParamBag, key: &str, default: f32) -> f32 {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .map(|f| f as f32)
        .unwrap_or(default)
}

pub(crate) fn get_u32(params: &ParamBag, key: &str, default: u32) -> u32 {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|u| u as u32)
        .unwrap_or(default)
}

pub(crate) fn get_vec3(params: &ParamBag, key: &str, default: [f32; 3]) -> [f32; 3] {
    let Some(seq) = params.get(key).and_then(|v| v.as_sequence()) else {
        return default;
    };
    let mut arr = default;
    for (i, val) in seq.iter().take(3).enumerate() {
        if let Some(f) = val.as_f64() {
            arr[i] = f as f32;
        }
    }
    arr
}

pub(crate) fn require_positive(value: f32, field: &str) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(HarnessError::spec_invalid(field, "must be a positive finite number"))
    }
}

pub(crate) fn require_non_negative(value: f32, field: &str) -> Result<f32> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(HarnessError::spec_invalid(field, "must be a non-negative finite number"))
    }
}
