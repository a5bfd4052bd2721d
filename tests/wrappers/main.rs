mod readonly_ops;
