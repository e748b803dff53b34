mod contact;
mod health_check;
mod helpers;
mod schedule_check;
mod subscriptions;
mod unsubscribe;
