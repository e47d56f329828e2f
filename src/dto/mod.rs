//! DTOs de la API HTTP

pub mod status_dto;
