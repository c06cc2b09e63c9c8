//! API handlers for the note taking service.
//!
//! `auth` owns identity (registration, login, sessions, verification);
//! `notes` and `profile` are the resource routes behind the session gate.

pub mod auth;
pub mod health;
pub mod notes;
pub mod profile;
pub mod root;
