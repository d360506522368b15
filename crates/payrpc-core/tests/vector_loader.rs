//! JSON test vector loader shared by the serializer and signature tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CanonicalVector {
    pub description: String,
    /// Kept as wire text so number lexemes reach the serializer untouched.
    pub input: Box<RawValue>,
    pub expect: String,
}

#[derive(Debug, Deserialize)]
pub struct SignatureFixture {
    pub description: String,
    pub method: String,
    pub uuid: String,
    pub data: Value,
    pub serialized: String,
    pub signature: String,
}

pub fn load<T: DeserializeOwned>(name: &str) -> T {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

pub fn key(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/keys/{name}")).unwrap()
}
