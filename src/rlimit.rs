use std::io;

/// 解除 memlock 限制, 加载 ebpf 程序和 map 需要锁定内存
pub fn remove_memlock() -> io::Result<()> {
    let rlimit = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };

    if unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlimit) } != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}
