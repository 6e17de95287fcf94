use std::sync::mpsc;

/// Runs `work` on a background thread and hands back the receiving end.
///
/// The caller polls the receiver from its own thread, so results are always
/// applied where the engine state lives.
pub(crate) fn spawn_worker_action<T, W>(work: W) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        let _ = tx.send(result);
    });
    rx
}
