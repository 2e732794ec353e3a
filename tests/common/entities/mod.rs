pub mod account;
pub mod address;
pub mod city;
pub mod user;
