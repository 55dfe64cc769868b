pub mod m202607010001_create_users;
pub mod m202607010002_create_question_sets;
pub mod m202607010004_create_notifications;
pub mod m202607010005_create_follow_graph;
pub mod m202607010006_create_connections;
pub mod m202607010007_create_violation_alerts;
pub mod m202607010008_create_test_attempts;
