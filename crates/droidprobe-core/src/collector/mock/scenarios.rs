//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys` states for an
//! Android device with and without the usual access restrictions.

use super::filesystem::MockFs;

/// `/proc/net/tcp` with a listener, an established connection, an IPv6
/// entry (not decoded) and a garbled line.
pub const TCP_TABLE: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:13AD 00000000:0000 0A 00000000:00000000 00:00000000 00000000  2000        0 28313 1 0000000000000000 100 0 0 10 0
   1: 0F02000A:A2C4 8E0BD9AC:01BB 01 00000000:00000000 02:000A7D1B 00000000 10123        0 46172 2 0000000000000000 21 4 30 10 -1
   2: 0F02000A:9C40 5D3ABC8E:0050 06 00000000:00000000 03:00001770 00000000     0        0 0 3 0000000000000000
   3: ~~~ truncated
";

pub const UDP_TABLE: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
  412: 00000000:14E9 00000000:0000 07 00000000:00000000 00:00000000 00000000  1021        0 19344 2 0000000000000000 0
  977: 0F02000A:D8A5 08080808:0035 01 00000000:00000000 00:00000000 00000000 10123        0 47001 2 0000000000000000 0
";

pub const MOUNTS: &str = "\
/dev/block/dm-0 / ext4 ro,seclabel,relatime 0 0
tmpfs /dev tmpfs rw,seclabel,nosuid,relatime,size=3885548k,nr_inodes=971387,mode=755 0 0
proc /proc proc rw,relatime,gid=3009,hidepid=invisible 0 0
sysfs /sys sysfs rw,seclabel,relatime 0 0
/dev/block/dm-1 /system_ext ext4 ro,seclabel,relatime 0 0
/dev/block/dm-2 /vendor ext4 ro,seclabel,relatime 0 0
/dev/block/dm-3 /product ext4 ro,seclabel,relatime 0 0
/dev/block/dm-40 /data f2fs rw,lazytime,seclabel,nosuid,nodev,noatime,background_gc=on 0 0
/dev/fuse /storage/emulated fuse rw,lazytime,nosuid,nodev,noexec,noatime,user_id=0,group_id=0 0 0
/dev/block/loop12 /apex/com.android.tzdata@340818000 ext4 ro,dirsync,seclabel,nodev,noatime 0 0
/dev/fuse /mnt/media_rw/My\\040Drive fuse rw,nosuid,nodev 0 0
";

pub const MEMINFO: &str = "\
MemTotal:        7773264 kB
MemFree:          312044 kB
MemAvailable:    3418628 kB
Buffers:            4980 kB
Cached:          3207916 kB
SwapCached:        20696 kB
Active:          2463756 kB
Inactive:        2930392 kB
SwapTotal:       4194300 kB
SwapFree:        3357180 kB
Dirty:               284 kB
AnonPages:       2162336 kB
Shmem:             29864 kB
KReclaimable:     295500 kB
CmaTotal:         172032 kB
HugePages_Total:       0
Hugepagesize:       2048 kB
";

impl MockFs {
    /// A device where everything is readable, as seen by root or an
    /// older release.
    ///
    /// Includes: the system-wide `/proc` files, four processes, three
    /// thermal zones (millidegree and whole-degree), SELinux enforcing
    /// and a mounted tracefs.
    pub fn typical_android() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "93784.50 351203.77\n");
        fs.add_file("/proc/loadavg", "1.25 0.98 0.75 3/1894 23145\n");
        fs.add_file("/proc/meminfo", MEMINFO);
        fs.add_file("/proc/mounts", MOUNTS);
        fs.add_file("/proc/net/tcp", TCP_TABLE);
        fs.add_file("/proc/net/udp", UDP_TABLE);

        fs.add_process(1, "init", "S (sleeping)", 1);
        fs.add_process(2, "kthreadd", "S (sleeping)", 1);
        fs.add_process(612, "surfaceflinger", "S (sleeping)", 27);
        fs.add_process(4242, "com.android.systemui", "R (running)", 96);
        fs.add_dir("/proc/self");
        fs.add_dir("/proc/sys");

        fs.add_thermal_zone(0, "cpu-0-0-usr", "43600");
        fs.add_thermal_zone(1, "battery", "31");
        fs.add_thermal_zone(2, "skin-therm", "35250");

        fs.add_file("/sys/fs/selinux/enforce", "1");

        fs.add_file("/sys/kernel/tracing/current_tracer", "nop\n");
        fs.add_file(
            "/sys/kernel/tracing/available_tracers",
            "blk function_graph wakeup_dl wakeup_rt wakeup function nop\n",
        );
        fs.add_file(
            "/sys/kernel/tracing/trace_clock",
            "local global counter uptime perf mono mono_raw [boot] tai\n",
        );

        fs
    }

    /// A stock non-rooted device on a recent release.
    ///
    /// `/proc/loadavg`, `/proc/net/*`, other apps' process entries, SELinux
    /// status and tracefs are blocked. Only `/proc/mounts` among the three
    /// mount views is blocked. Thermal zone 1 exists but its temperature is
    /// unreadable.
    pub fn locked_down() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "93784.50 351203.77\n");
        fs.deny("/proc/loadavg");
        fs.add_file("/proc/meminfo", MEMINFO);
        fs.deny("/proc/mounts");
        fs.add_file("/proc/self/mounts", MOUNTS);
        fs.deny("/proc/net/tcp");
        fs.deny("/proc/net/udp");

        fs.add_process(4242, "com.example.app", "S (sleeping)", 18);
        fs.add_dir("/proc/1");
        fs.deny("/proc/1/status");
        fs.add_dir("/proc/612");
        fs.deny("/proc/612/status");

        fs.add_thermal_zone(0, "cpu-0-0-usr", "43600");
        fs.add_thermal_zone(1, "battery", "31");
        fs.deny("/sys/class/thermal/thermal_zone1/temp");
        fs.add_thermal_zone(2, "skin-therm", "35250");

        fs.deny("/sys/fs/selinux/enforce");
        for file in ["current_tracer", "available_tracers", "trace_clock"] {
            fs.deny(format!("/sys/kernel/tracing/{file}"));
        }

        fs
    }
}
