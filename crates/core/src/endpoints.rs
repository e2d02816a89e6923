// Engine endpoint paths

use crate::domain::TaskId;

pub fn health() -> String {
    "/health".to_string()
}

pub fn indexes() -> String {
    "/indexes".to_string()
}

pub fn index(uid: &str) -> String {
    format!("/indexes/{}", uid)
}

pub fn documents(uid: &str) -> String {
    format!("/indexes/{}/documents", uid)
}

pub fn document(uid: &str, id: &str) -> String {
    format!("/indexes/{}/documents/{}", uid, id)
}

pub fn delete_batch(uid: &str) -> String {
    format!("/indexes/{}/documents/delete-batch", uid)
}

pub fn settings(uid: &str) -> String {
    format!("/indexes/{}/settings", uid)
}

pub fn stats(uid: &str) -> String {
    format!("/indexes/{}/stats", uid)
}

pub fn search(uid: &str) -> String {
    format!("/indexes/{}/search", uid)
}

pub fn index_tasks(uid: &str) -> String {
    format!("/indexes/{}/tasks", uid)
}

pub fn index_task(uid: &str, task_id: TaskId) -> String {
    format!("/indexes/{}/tasks/{}", uid, task_id)
}

pub fn tasks() -> String {
    "/tasks".to_string()
}
