//! Serde helpers for values that don't map directly onto serde types.

/// `f64` fields where NaN means "undefined": written as `null`, read back as NaN.
pub mod nan_as_null {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<f64> = Deserialize::deserialize(deserializer)?;
        Ok(opt.unwrap_or(f64::NAN))
    }
}

pub mod vec3_serde {
    use lin_alg::f64::Vec3;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [v.x, v.y, v.z].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y, z]: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Vec3::new(x, y, z))
    }
}
