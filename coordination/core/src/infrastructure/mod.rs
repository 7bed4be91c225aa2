// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod broker;
pub mod stores;

pub use broker::{BrokerError, DeliveryCore, Inbox, MessageBroker};
