#![allow(non_snake_case)]

mod reconcile;
