mod behaviour;
mod support;
mod unit;
