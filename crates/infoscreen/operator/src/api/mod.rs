//! HTTP API for infoscreen-operator

pub mod rest;
