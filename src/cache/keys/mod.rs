pub mod engagement_keys;
