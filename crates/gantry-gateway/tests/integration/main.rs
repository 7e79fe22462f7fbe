mod fixtures;

mod auth;
mod authz;
mod builds;
mod envs;
mod roles;
