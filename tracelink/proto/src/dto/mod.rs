pub mod ingress;
pub mod options;
