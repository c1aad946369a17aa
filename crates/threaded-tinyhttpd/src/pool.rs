//! 接続処理用の固定サイズワーカープール
//!
//! ジョブキューは有界 (`queue_capacity`)。キューが満杯のときは
//! [`execute`](WorkerPool::execute) がブロックするので、投入側の
//! アクセプターに自然なバックプレッシャーがかかる。無制限に
//! キューイングして飽和時にメモリを食い潰す構成は取らない。
//!
//! プールの Drop で投入を締め切り、キューに残ったジョブを
//! ワーカーが処理し終えるのを待ってから join する。

use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// 固定サイズのワーカープール
pub struct WorkerPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// ワーカー数とキュー容量を指定してプールを作成
    pub fn new(size: usize, queue_capacity: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::sync_channel::<Job>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            let receiver = Arc::clone(&receiver);
            workers.push(thread::spawn(move || {
                loop {
                    // ガードはジョブ実行前に手放す
                    let message = {
                        let guard = match receiver.lock() {
                            Ok(guard) => guard,
                            Err(_) => break,
                        };
                        guard.recv()
                    };
                    match message {
                        Ok(job) => job(),
                        // 送信側が閉じられ、キューも空になった
                        Err(_) => break,
                    }
                }
            }));
        }

        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// ジョブを投入
    ///
    /// キューが満杯のときは空きが出るまでブロックする。プールが
    /// 停止済みの場合、ジョブは破棄される。
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(job));
        }
    }

    /// ワーカー数を取得
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // 送信側を閉じて新規投入を締め切る。投入済みのジョブは
        // ワーカーがキューを飲み干してから終了する。
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_jobs_run_on_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(4, 16);

        for _ in 0..32 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        drop(pool); // 投入済みジョブの完了を待つ
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_single_worker_runs_jobs_sequentially() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(1, 4);

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let pool = WorkerPool::new(0, 1);
        assert_eq!(pool.size(), 1);
    }
}
